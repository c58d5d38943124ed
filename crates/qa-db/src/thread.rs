//! Reply forest for one question, held in an identifier-indexed arena.
//!
//! The store only knows flat rows with a nullable `parent_id`. `ReplyThread`
//! loads them once and answers tree questions without further queries.
//! Replies whose parent is not on the question are treated as roots, and a
//! parent cycle already in the store is broken at its lowest id, so every
//! reply appears in `walk()` exactly once.

use std::collections::HashMap;

use crate::{Database, DbResult, Reply};

#[derive(Debug, Clone)]
pub struct ReplyThread {
    question_id: i64,
    /// Arena, ordered by id.
    replies: Vec<Reply>,
    index: HashMap<i64, usize>,
    parents: Vec<Option<usize>>,
    children: Vec<Vec<usize>>,
    roots: Vec<usize>,
    /// Depth-first visit order and the depth of each slot.
    order: Vec<usize>,
    depths: Vec<usize>,
}

impl ReplyThread {
    pub fn for_question(db: &Database, question_id: i64) -> DbResult<Self> {
        let replies = Reply::get_replies_by_question(db, question_id)?;
        Ok(Self::from_replies(question_id, replies))
    }

    /// Build from already fetched replies. Unsaved replies and replies on
    /// other questions are dropped.
    pub fn from_replies(question_id: i64, mut replies: Vec<Reply>) -> Self {
        replies.retain(|r| r.id.is_some() && r.question_id == question_id);
        replies.sort_by_key(|r| r.id);

        let index: HashMap<i64, usize> = replies
            .iter()
            .enumerate()
            .filter_map(|(slot, r)| r.id.map(|id| (id, slot)))
            .collect();

        let mut parents = vec![None; replies.len()];
        let mut children = vec![Vec::new(); replies.len()];
        let mut roots = Vec::new();
        for (slot, reply) in replies.iter().enumerate() {
            match reply.parent_id.and_then(|p| index.get(&p).copied()) {
                Some(parent) if parent != slot => {
                    parents[slot] = Some(parent);
                    children[parent].push(slot);
                }
                _ => roots.push(slot),
            }
        }

        let len = replies.len();
        let mut thread = Self {
            question_id,
            replies,
            index,
            parents,
            children,
            roots,
            order: Vec::with_capacity(len),
            depths: vec![0; len],
        };
        thread.assemble();
        thread
    }

    fn assemble(&mut self) {
        let mut visited = vec![false; self.replies.len()];
        for i in 0..self.roots.len() {
            let root = self.roots[i];
            self.visit(root, &mut visited);
        }

        // Whatever is left sits on, or hangs below, a parent cycle.
        while let Some(slot) = visited.iter().position(|seen| !seen) {
            let root = self.cycle_root(slot);
            if let Some(parent) = self.parents[root].take() {
                self.children[parent].retain(|&c| c != root);
            }
            self.roots.push(root);
            self.visit(root, &mut visited);
        }
    }

    /// Follow parent links from `start` until a slot repeats and return the
    /// lowest slot on that cycle. Slots are in id order.
    fn cycle_root(&self, start: usize) -> usize {
        let mut path = vec![start];
        let mut slot = start;
        loop {
            slot = match self.parents[slot] {
                Some(parent) => parent,
                None => return slot,
            };
            if let Some(pos) = path.iter().position(|&s| s == slot) {
                return path[pos..].iter().copied().min().unwrap_or(slot);
            }
            path.push(slot);
        }
    }

    fn visit(&mut self, root: usize, visited: &mut [bool]) {
        let mut stack = vec![(root, 0)];
        while let Some((slot, depth)) = stack.pop() {
            if visited[slot] {
                continue;
            }
            visited[slot] = true;
            self.depths[slot] = depth;
            self.order.push(slot);

            for &child in self.children[slot].iter().rev() {
                if !visited[child] {
                    stack.push((child, depth + 1));
                }
            }
        }
    }

    pub fn question_id(&self) -> i64 {
        self.question_id
    }

    pub fn len(&self) -> usize {
        self.replies.len()
    }

    pub fn is_empty(&self) -> bool {
        self.replies.is_empty()
    }

    pub fn get(&self, id: i64) -> Option<&Reply> {
        self.index.get(&id).map(|&slot| &self.replies[slot])
    }

    pub fn roots(&self) -> impl Iterator<Item = &Reply> + '_ {
        self.roots.iter().map(|&slot| &self.replies[slot])
    }

    /// Direct children of `id`; empty when `id` is not in the thread.
    pub fn children(&self, id: i64) -> impl Iterator<Item = &Reply> + '_ {
        self.index
            .get(&id)
            .into_iter()
            .flat_map(move |&slot| self.children[slot].iter().map(move |&c| &self.replies[c]))
    }

    /// 0 for roots.
    pub fn depth(&self, id: i64) -> Option<usize> {
        self.index.get(&id).map(|&slot| self.depths[slot])
    }

    /// Every reply once, depth-first, children in id order, with its depth.
    pub fn walk(&self) -> impl Iterator<Item = (usize, &Reply)> + '_ {
        self.order
            .iter()
            .map(|&slot| (self.depths[slot], &self.replies[slot]))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutil;

    fn stored(id: i64, question_id: i64, parent_id: Option<i64>) -> Reply {
        Reply {
            id: Some(id),
            question_id,
            user_id: 1,
            parent_id,
            body: format!("reply {}", id),
        }
    }

    fn walk_ids(thread: &ReplyThread) -> Vec<(usize, i64)> {
        thread
            .walk()
            .map(|(depth, r)| (depth, r.id().unwrap()))
            .collect()
    }

    #[test]
    fn assembles_forest_from_store() {
        let db = testutil::db();
        let ada = testutil::user(&db, "Ada", "Lovelace");
        let question = testutil::question(&db, &ada, "Title", "Body");
        let r1 = testutil::reply(&db, &question, &ada, None, "first");
        let r2 = testutil::reply(&db, &question, &ada, None, "second root");
        let r3 = testutil::reply(&db, &question, &ada, Some(&r1), "answer to first");
        let r4 = testutil::reply(&db, &question, &ada, Some(&r3), "deeper");
        let r5 = testutil::reply(&db, &question, &ada, Some(&r1), "another answer");

        let thread = question.thread(&db).unwrap();
        let id = |r: &Reply| r.id().unwrap();

        assert_eq!(thread.len(), 5);
        assert_eq!(thread.roots().map(id).collect::<Vec<_>>(), vec![id(&r1), id(&r2)]);
        assert_eq!(thread.children(id(&r1)).map(id).collect::<Vec<_>>(), vec![id(&r3), id(&r5)]);
        assert_eq!(thread.depth(id(&r4)), Some(2));
        assert_eq!(
            walk_ids(&thread),
            vec![(0, id(&r1)), (1, id(&r3)), (2, id(&r4)), (1, id(&r5)), (0, id(&r2))]
        );
        assert_eq!(thread.get(id(&r4)).unwrap().body, "deeper");
    }

    #[test]
    fn empty_question_has_empty_thread() {
        let db = testutil::db();
        let ada = testutil::user(&db, "Ada", "Lovelace");
        let question = testutil::question(&db, &ada, "Title", "Body");

        let thread = ReplyThread::for_question(&db, question.id().unwrap()).unwrap();
        assert!(thread.is_empty());
        assert_eq!(thread.walk().count(), 0);
        assert_eq!(thread.children(1).count(), 0);
        assert_eq!(thread.depth(1), None);
    }

    #[test]
    fn missing_or_foreign_parent_becomes_root() {
        let replies = vec![
            stored(3, 1, Some(2)),
            stored(1, 1, None),
            stored(4, 1, Some(99)),
            stored(5, 2, None),
        ];

        let thread = ReplyThread::from_replies(1, replies);
        assert_eq!(thread.len(), 3);
        assert_eq!(walk_ids(&thread), vec![(0, 1), (0, 3), (0, 4)]);
    }

    #[test]
    fn reply_hanging_off_a_cycle_stays_below_it() {
        let replies = vec![
            stored(2, 1, Some(5)),
            stored(5, 1, Some(6)),
            stored(6, 1, Some(5)),
        ];

        let thread = ReplyThread::from_replies(1, replies);
        assert_eq!(walk_ids(&thread), vec![(0, 5), (1, 2), (1, 6)]);
        let id = |r: &Reply| r.id().unwrap();
        assert_eq!(thread.roots().map(id).collect::<Vec<_>>(), vec![5]);
        assert_eq!(thread.children(5).map(id).collect::<Vec<_>>(), vec![2, 6]);
        assert_eq!(thread.children(6).count(), 0);
        assert_eq!(thread.depth(2), Some(1));
    }

    #[test]
    fn stored_cycle_is_broken_at_lowest_id() {
        let replies = vec![
            stored(1, 1, None),
            stored(2, 1, Some(3)),
            stored(3, 1, Some(2)),
            stored(4, 1, Some(4)),
        ];

        let thread = ReplyThread::from_replies(1, replies);
        assert_eq!(walk_ids(&thread), vec![(0, 1), (0, 4), (0, 2), (1, 3)]);
        assert_eq!(thread.roots().count(), 3);
    }
}
