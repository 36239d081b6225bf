//! Dense identifier encodings for the rating model.
//!
//! The pretrained model addresses users and items by their position in its
//! embedding tables. Positions are assigned here in first-seen order over
//! the merged rating dataset, starting at 0, which is the same order the
//! model was trained with.

use crate::error::{EncodingError, IdentifierKind};
use crate::types::{DataIndex, ItemIndex, Rating, UserId, UserIndex};
use std::collections::HashMap;
use std::hash::Hash;

/// A bijection between keys and `0..len` in first-seen order.
///
/// Never grows after construction.
#[derive(Debug, Clone)]
pub struct Encoding<K> {
    forward: HashMap<K, u32>,
    reverse: Vec<K>,
}

impl<K: Clone + Eq + Hash> Encoding<K> {
    /// Build from keys in order; repeated keys keep their first position
    pub fn from_keys<'a, I>(keys: I) -> Self
    where
        I: IntoIterator<Item = &'a K>,
        K: 'a,
    {
        let mut forward = HashMap::new();
        let mut reverse = Vec::new();
        for key in keys {
            if !forward.contains_key(key) {
                forward.insert(key.clone(), reverse.len() as u32);
                reverse.push(key.clone());
            }
        }
        Self { forward, reverse }
    }

    pub fn get<Q>(&self, key: &Q) -> Option<u32>
    where
        K: std::borrow::Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.forward.get(key).copied()
    }

    pub fn key(&self, index: u32) -> Option<&K> {
        self.reverse.get(index as usize)
    }

    pub fn len(&self) -> usize {
        self.reverse.len()
    }

    pub fn is_empty(&self) -> bool {
        self.reverse.is_empty()
    }

    /// Keys in index order
    pub fn keys(&self) -> &[K] {
        &self.reverse
    }
}

/// User and item encodings built from one rating dataset.
///
/// Items are keyed by title, the cross-reference key shared by the catalog
/// and the rating files.
#[derive(Debug, Clone)]
pub struct IdentifierIndex {
    users: Encoding<UserId>,
    items: Encoding<String>,
}

impl IdentifierIndex {
    /// Build the encodings from ratings, in rating order
    pub fn build(ratings: &[Rating]) -> Self {
        let users = Encoding::from_keys(ratings.iter().map(|r| &r.user_id));
        let items = Encoding::from_keys(ratings.iter().map(|r| &r.title));
        Self { users, items }
    }

    /// Build from the merged ratings held by a DataIndex
    pub fn from_data_index(data_index: &DataIndex) -> Self {
        Self::build(data_index.ratings())
    }

    pub fn encode_user(&self, user_id: &UserId) -> Result<UserIndex, EncodingError> {
        self.users
            .get(user_id)
            .map(UserIndex)
            .ok_or_else(|| EncodingError::UnknownIdentifier {
                kind: IdentifierKind::User,
                id: user_id.to_string(),
            })
    }

    pub fn encode_item(&self, title: &str) -> Result<ItemIndex, EncodingError> {
        self.items
            .get(title)
            .map(ItemIndex)
            .ok_or_else(|| EncodingError::UnknownIdentifier {
                kind: IdentifierKind::Item,
                id: title.to_string(),
            })
    }

    pub fn decode_user(&self, index: UserIndex) -> Option<&UserId> {
        self.users.key(index.0)
    }

    pub fn decode_item(&self, index: ItemIndex) -> Option<&str> {
        self.items.key(index.0).map(String::as_str)
    }

    pub fn contains_item(&self, title: &str) -> bool {
        self.items.get(title).is_some()
    }

    pub fn num_users(&self) -> usize {
        self.users.len()
    }

    pub fn num_items(&self) -> usize {
        self.items.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rating(user: &str, title: &str, score: f32) -> Rating {
        Rating {
            user_id: UserId::new(user),
            title: title.to_string(),
            score,
        }
    }

    fn sample_ratings() -> Vec<Rating> {
        vec![
            rating("u2", "Emma", 4.0),
            rating("u1", "Dune", 5.0),
            rating("u2", "Dune", 3.0),
            rating("u3", "Persuasion", 2.0),
        ]
    }

    #[test]
    fn test_first_seen_order() {
        let index = IdentifierIndex::build(&sample_ratings());

        assert_eq!(index.encode_user(&UserId::new("u2")).unwrap(), UserIndex(0));
        assert_eq!(index.encode_user(&UserId::new("u1")).unwrap(), UserIndex(1));
        assert_eq!(index.encode_user(&UserId::new("u3")).unwrap(), UserIndex(2));
        assert_eq!(index.encode_item("Emma").unwrap(), ItemIndex(0));
        assert_eq!(index.encode_item("Dune").unwrap(), ItemIndex(1));
        assert_eq!(index.encode_item("Persuasion").unwrap(), ItemIndex(2));
        assert_eq!(index.num_users(), 3);
        assert_eq!(index.num_items(), 3);
    }

    #[test]
    fn test_round_trip_is_bijection() {
        let ratings = sample_ratings();
        let index = IdentifierIndex::build(&ratings);

        for r in &ratings {
            let user = index.encode_user(&r.user_id).unwrap();
            assert_eq!(index.decode_user(user), Some(&r.user_id));
            let item = index.encode_item(&r.title).unwrap();
            assert_eq!(index.decode_item(item), Some(r.title.as_str()));
        }
    }

    #[test]
    fn test_unknown_identifiers_fail() {
        let index = IdentifierIndex::build(&sample_ratings());

        let err = index.encode_user(&UserId::new("ghost")).unwrap_err();
        assert_eq!(
            err,
            EncodingError::UnknownIdentifier {
                kind: IdentifierKind::User,
                id: "ghost".to_string(),
            }
        );
        assert!(index.encode_item("Ulysses").is_err());
        assert!(!index.contains_item("Ulysses"));

        // Failed lookups never extend the mapping
        assert_eq!(index.num_users(), 3);
        assert_eq!(index.num_items(), 3);
        assert_eq!(index.decode_user(UserIndex(3)), None);
        assert_eq!(index.decode_item(ItemIndex(99)), None);
    }

    #[test]
    fn test_empty_ratings() {
        let index = IdentifierIndex::build(&[]);
        assert_eq!(index.num_users(), 0);
        assert_eq!(index.num_items(), 0);
    }
}
