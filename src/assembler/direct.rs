// src/assembler/direct.rs
use crate::assembler::{AreaAssembler, Assembly, AssemblySource, next_area_id};
use crate::model::{Area, Level};

/// Собирает территории напрямую из граничных линий отношений
#[derive(Debug, Clone, Copy)]
pub struct DirectAreaAssembler<'a> {
    source: AssemblySource<'a>,
}

impl<'a> DirectAreaAssembler<'a> {
    #[must_use]
    pub fn new(source: AssemblySource<'a>) -> Self {
        Self { source }
    }
}

impl AreaAssembler for DirectAreaAssembler<'_> {
    fn assemble(&self, existing: &[Area], levels: &[Level]) -> Assembly {
        let mut assembly = Assembly::default();
        let mut next_id = next_area_id(existing);

        for relation in self.source.relations_at(levels) {
            match self.source.relation_polygons(relation) {
                Some(polygons) => {
                    assembly.areas.push(Area {
                        id: next_id,
                        relation: relation.id,
                        level: relation.level,
                        name: relation.name.clone(),
                        polygons,
                        members: Vec::new(),
                    });
                    next_id += 1;
                }
                None => {
                    tracing::debug!(relation = relation.id, "outer boundary does not close");
                    assembly.incomplete.insert(relation.id);
                }
            }
        }

        assembly
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assembler::tests::square_with_hole;
    use crate::model::{Line, Member, Point, Relation, Role};

    #[test]
    fn closed_outer_produces_one_closed_ring() {
        let data = square_with_hole();
        let assembly = DirectAreaAssembler::new(AssemblySource::from_dataset(&data)).assemble(&[], &[4]);
        assert!(assembly.incomplete.is_empty());
        assert_eq!(assembly.areas.len(), 1);

        let area = &assembly.areas[0];
        assert_eq!(area.relation, 100);
        assert_eq!(area.name.as_deref(), Some("Square"));
        assert_eq!(area.polygons.len(), 1);
        let outer = area.polygons[0].outer.ids();
        assert_eq!(outer.first(), outer.last());
        assert_eq!(area.polygons[0].inners.len(), 1);
    }

    #[test]
    fn open_outer_marks_relation_incomplete() {
        let mut data = square_with_hole();
        // разрываем границу: линия 11 больше не доходит до точки 3
        data.lines.insert(11, Line::new(11, vec![1, 4]));
        let assembly = DirectAreaAssembler::new(AssemblySource::from_dataset(&data)).assemble(&[], &[4]);
        assert!(assembly.areas.is_empty());
        assert!(assembly.incomplete.contains(&100));
    }

    #[test]
    fn other_levels_are_ignored() {
        let data = square_with_hole();
        let assembly = DirectAreaAssembler::new(AssemblySource::from_dataset(&data)).assemble(&[], &[6]);
        assert!(assembly.areas.is_empty());
        assert!(assembly.incomplete.is_empty());
    }

    #[test]
    fn decoder_incomplete_relations_are_skipped() {
        let mut data = square_with_hole();
        data.incomplete_relations.insert(100);
        let assembly = DirectAreaAssembler::new(AssemblySource::from_dataset(&data)).assemble(&[], &[4]);
        assert!(assembly.areas.is_empty());
    }

    #[test]
    fn multipart_relation_keeps_all_parts() {
        let mut data = square_with_hole();
        for (id, x, y) in [(20, 10.0, 0.0), (21, 11.0, 0.0), (22, 11.0, 1.0)] {
            data.points.insert(id, Point::new(id, x, y));
        }
        data.lines.insert(30, Line::new(30, vec![20, 21, 22, 20]));
        data.relations.insert(
            101,
            Relation {
                id: 101,
                level: 4,
                name: None,
                members: vec![
                    Member { line: 10, role: Role::Outer },
                    Member { line: 11, role: Role::Outer },
                    Member { line: 30, role: Role::Outer },
                ],
                subareas: Vec::new(),
            },
        );
        let assembly = DirectAreaAssembler::new(AssemblySource::from_dataset(&data)).assemble(&[], &[4]);
        let area = assembly.areas.iter().find(|a| a.relation == 101).unwrap();
        assert_eq!(area.polygons.len(), 2);
        assert!(area.polygons.iter().all(|p| p.outer.is_closed()));
        // id областей уникальны и идут по порядку отношений
        assert_eq!(assembly.areas.iter().map(|a| a.id).collect::<Vec<_>>(), vec![0, 1]);
    }
}
