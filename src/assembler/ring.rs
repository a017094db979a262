// src/assembler/ring.rs
//! Замыкание колец из фрагментов
//!
//! Фрагмент — последовательность id точек (линия OSM или отдельный отрезок).
//! Фрагменты сцепляются по совпадающим концам через хеш-индекс концов, поэтому
//! сборка почти линейна по числу фрагментов. Цепочка растёт с хвоста, а когда
//! продолжить её нечем — с начала, так что незамкнутый участок остаётся одним куском.

use std::collections::HashMap;

use crate::model::{ObjectId, Ring};

/// Результат замыкания: готовые кольца и цепочки, которые замкнуть не удалось
#[derive(Debug, Default)]
pub struct RingClosure {
    pub rings: Vec<Ring>,
    pub open: Vec<Vec<ObjectId>>,
}

impl RingClosure {
    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.open.is_empty()
    }
}

/// Сцепляет фрагменты в замкнутые кольца.
///
/// При `reversible == true` фрагмент можно присоединить в обратном направлении
/// (линии OSM не ориентированы). Направленные фрагменты (отрезки уже
/// ориентированных колец) присоединяются только началом к концу цепочки.
#[must_use]
pub fn close_rings(fragments: Vec<Vec<ObjectId>>, reversible: bool) -> RingClosure {
    let mut closure = RingClosure::default();
    let mut pending: Vec<Vec<ObjectId>> = Vec::with_capacity(fragments.len());

    for fragment in fragments {
        match fragment.len() {
            0 => {}
            1 => closure.open.push(fragment),
            _ if fragment.first() == fragment.last() => {
                if fragment.len() > 3 {
                    closure.rings.push(Ring(fragment));
                } else {
                    closure.open.push(fragment);
                }
            }
            _ => pending.push(fragment),
        }
    }

    // Индексы концов: `starts` — фрагменты, продолжающие цепочку с хвоста,
    // `ends` — фрагменты, которые можно приставить к её началу.
    // Для неориентированных фрагментов оба индекса содержат оба конца.
    let mut starts: HashMap<ObjectId, Vec<usize>> = HashMap::new();
    let mut ends: HashMap<ObjectId, Vec<usize>> = HashMap::new();
    for (i, fragment) in pending.iter().enumerate() {
        let (first, last) = (fragment[0], fragment[fragment.len() - 1]);
        starts.entry(first).or_default().push(i);
        ends.entry(last).or_default().push(i);
        if reversible {
            starts.entry(last).or_default().push(i);
            ends.entry(first).or_default().push(i);
        }
    }

    let mut used = vec![false; pending.len()];
    for start in 0..pending.len() {
        if used[start] {
            continue;
        }
        used[start] = true;
        let mut chain = pending[start].clone();

        loop {
            let head = chain[0];
            let tail = chain[chain.len() - 1];
            if head == tail {
                break;
            }

            if let Some(next) = pick_next(&starts, &pending, &used, head, tail) {
                used[next] = true;
                let fragment = &pending[next];
                if fragment[0] == tail {
                    chain.extend_from_slice(&fragment[1..]);
                } else {
                    chain.extend(fragment.iter().rev().skip(1));
                }
                continue;
            }

            // хвост упёрся — пробуем нарастить цепочку с начала
            let Some(prev) = ends
                .get(&head)
                .and_then(|candidates| candidates.iter().copied().find(|&i| !used[i]))
            else {
                break;
            };
            used[prev] = true;
            let fragment = &pending[prev];
            let mut extended: Vec<ObjectId> = if fragment[fragment.len() - 1] == head {
                fragment[..fragment.len() - 1].to_vec()
            } else {
                fragment[1..].iter().rev().copied().collect()
            };
            extended.extend_from_slice(&chain);
            chain = extended;
        }

        if chain.len() > 3 && chain.first() == chain.last() {
            closure.rings.push(Ring(chain));
        } else {
            closure.open.push(chain);
        }
    }

    closure
}

/// Выбирает следующий фрагмент для цепочки, заканчивающейся в `tail`.
/// Предпочитает фрагмент, который сразу замыкает кольцо.
fn pick_next(
    index: &HashMap<ObjectId, Vec<usize>>,
    pending: &[Vec<ObjectId>],
    used: &[bool],
    head: ObjectId,
    tail: ObjectId,
) -> Option<usize> {
    let candidates = index.get(&tail)?;
    let mut fallback = None;
    for &i in candidates {
        if used[i] {
            continue;
        }
        let fragment = &pending[i];
        let far_end = if fragment[0] == tail {
            fragment[fragment.len() - 1]
        } else {
            fragment[0]
        };
        if far_end == head {
            return Some(i);
        }
        fallback.get_or_insert(i);
    }
    fallback
}
