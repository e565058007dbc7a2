//! Append-only comment lists keyed by post

use std::collections::{BTreeMap, HashMap};
use time::OffsetDateTime;

use crate::model::{Comment, CommentId, PostId, UserId};

/// Chronological comment lists with a comment → post secondary index.
///
/// Ids come from a counter that only moves forward, so each list is sorted
/// by id as well as by insertion order.
#[derive(Debug)]
pub struct CommentIndex {
    by_post: HashMap<PostId, Vec<Comment>>,
    owner: HashMap<CommentId, PostId>,
    next_id: u64,
}

impl Default for CommentIndex {
    fn default() -> Self {
        Self::new()
    }
}

impl CommentIndex {
    pub fn new() -> Self {
        Self {
            by_post: HashMap::new(),
            owner: HashMap::new(),
            next_id: 1,
        }
    }

    /// Append a comment. The caller has already checked the post exists.
    pub(crate) fn append(
        &mut self,
        post_id: PostId,
        author_id: UserId,
        body: String,
        created_at: OffsetDateTime,
    ) -> &Comment {
        let id = CommentId(self.next_id);
        self.next_id += 1;

        self.owner.insert(id, post_id);
        let list = self.by_post.entry(post_id).or_default();
        list.push(Comment {
            id,
            post_id,
            author_id,
            body,
            like_count: 0,
            created_at,
            is_liked: false,
        });
        &list[list.len() - 1]
    }

    /// Owning post of a comment
    pub fn owner_of(&self, id: &CommentId) -> Option<PostId> {
        self.owner.get(id).copied()
    }

    pub fn get(&self, id: &CommentId) -> Option<&Comment> {
        let post_id = self.owner.get(id)?;
        let list = self.by_post.get(post_id)?;
        list.binary_search_by_key(id, |c| c.id)
            .ok()
            .map(|index| &list[index])
    }

    pub(crate) fn get_mut(&mut self, id: &CommentId) -> Option<&mut Comment> {
        let post_id = self.owner.get(id)?;
        let list = self.by_post.get_mut(post_id)?;
        let index = list.binary_search_by_key(id, |c| c.id).ok()?;
        Some(&mut list[index])
    }

    /// Comments of a post, oldest first; empty for unknown posts
    pub fn comments_for(&self, post_id: &PostId) -> &[Comment] {
        self.by_post
            .get(post_id)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    pub fn count_for(&self, post_id: &PostId) -> usize {
        self.comments_for(post_id).len()
    }

    /// Drop every comment of a post and return their ids
    pub(crate) fn cascade_remove(&mut self, post_id: &PostId) -> Vec<CommentId> {
        let removed: Vec<CommentId> = self
            .by_post
            .remove(post_id)
            .unwrap_or_default()
            .into_iter()
            .map(|c| c.id)
            .collect();
        for id in &removed {
            self.owner.remove(id);
        }
        removed
    }

    pub fn len(&self) -> usize {
        self.owner.len()
    }

    pub fn is_empty(&self) -> bool {
        self.owner.is_empty()
    }

    pub fn next_id(&self) -> u64 {
        self.next_id
    }

    pub(crate) fn iter_mut(&mut self) -> impl Iterator<Item = &mut Comment> + '_ {
        self.by_post.values_mut().flat_map(|list| list.iter_mut())
    }

    /// All lists keyed by post, in id order
    pub fn to_map(&self) -> BTreeMap<PostId, Vec<Comment>> {
        self.by_post
            .iter()
            .filter(|(_, list)| !list.is_empty())
            .map(|(id, list)| (*id, list.clone()))
            .collect()
    }

    /// Replace all lists with loaded ones and rebuild the secondary index.
    ///
    /// The list key wins over a comment's own post id, a comment id seen
    /// twice keeps its first occurrence, and the id counter is raised past
    /// every loaded id.
    pub(crate) fn restore(&mut self, lists: BTreeMap<PostId, Vec<Comment>>, next_id: u64) {
        self.by_post.clear();
        self.owner.clear();

        let mut max_id = 0;
        for (post_id, mut list) in lists {
            list.sort_by_key(|c| c.id);
            list.retain(|c| !self.owner.contains_key(&c.id));
            list.dedup_by_key(|c| c.id);
            if list.is_empty() {
                continue;
            }
            for comment in &mut list {
                comment.post_id = post_id;
                self.owner.insert(comment.id, post_id);
                max_id = max_id.max(comment.id.0);
            }
            self.by_post.insert(post_id, list);
        }

        self.next_id = next_id.max(max_id + 1).max(1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::SourceTag;

    fn post(n: u64) -> PostId {
        PostId::remote(SourceTag::DummyJson, n)
    }

    #[test]
    fn test_comments_keep_insertion_order() {
        let mut index = CommentIndex::new();
        for body in ["first", "second", "third"] {
            index.append(post(1), UserId(1), body.to_string(), OffsetDateTime::UNIX_EPOCH);
        }

        let bodies: Vec<&str> = index
            .comments_for(&post(1))
            .iter()
            .map(|c| c.body.as_str())
            .collect();
        assert_eq!(bodies, vec!["first", "second", "third"]);
    }

    #[test]
    fn test_ids_strictly_increase_across_posts() {
        let mut index = CommentIndex::new();
        let a = index.append(post(1), UserId(1), "a".into(), OffsetDateTime::UNIX_EPOCH).id;
        let b = index.append(post(2), UserId(1), "b".into(), OffsetDateTime::UNIX_EPOCH).id;
        let c = index.append(post(1), UserId(1), "c".into(), OffsetDateTime::UNIX_EPOCH).id;
        assert!(a < b && b < c);
    }

    #[test]
    fn test_owner_lookup_and_get() {
        let mut index = CommentIndex::new();
        index.append(post(1), UserId(1), "a".into(), OffsetDateTime::UNIX_EPOCH);
        let id = index
            .append(post(2), UserId(3), "b".into(), OffsetDateTime::UNIX_EPOCH)
            .id;

        assert_eq!(index.owner_of(&id), Some(post(2)));
        assert_eq!(index.get(&id).unwrap().author_id, UserId(3));
        assert!(index.get(&CommentId(999)).is_none());
    }

    #[test]
    fn test_unknown_post_has_empty_comments() {
        let index = CommentIndex::new();
        assert!(index.comments_for(&post(7)).is_empty());
    }

    #[test]
    fn test_cascade_remove_purges_secondary_index() {
        let mut index = CommentIndex::new();
        let a = index.append(post(1), UserId(1), "a".into(), OffsetDateTime::UNIX_EPOCH).id;
        let b = index.append(post(1), UserId(1), "b".into(), OffsetDateTime::UNIX_EPOCH).id;
        let other = index.append(post(2), UserId(1), "c".into(), OffsetDateTime::UNIX_EPOCH).id;

        let removed = index.cascade_remove(&post(1));

        assert_eq!(removed, vec![a, b]);
        assert!(index.comments_for(&post(1)).is_empty());
        assert_eq!(index.owner_of(&a), None);
        assert_eq!(index.owner_of(&other), Some(post(2)));
        assert_eq!(index.len(), 1);
    }

    #[test]
    fn test_restore_raises_counter_past_loaded_ids() {
        let mut index = CommentIndex::new();
        let comment = Comment {
            id: CommentId(40),
            post_id: post(9),
            author_id: UserId(1),
            body: "loaded".into(),
            like_count: 2,
            created_at: OffsetDateTime::UNIX_EPOCH,
            is_liked: false,
        };
        let mut lists = BTreeMap::new();
        lists.insert(post(1), vec![comment]);

        index.restore(lists, 3);

        assert_eq!(index.next_id(), 41);
        assert_eq!(index.owner_of(&CommentId(40)), Some(post(1)));
        assert_eq!(index.get(&CommentId(40)).unwrap().post_id, post(1));

        let next = index
            .append(post(1), UserId(1), "new".into(), OffsetDateTime::UNIX_EPOCH)
            .id;
        assert_eq!(next, CommentId(41));
    }
}
