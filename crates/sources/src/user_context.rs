//! Helper functions to build UserContext from DataIndex
//!
//! Gathers a user's rating history once so the prediction flow does not
//! query the DataIndex again while filtering and ranking.

use crate::types::UserContext;
use data_loader::{DataIndex, UserId};

/// Build a UserContext from DataIndex for a given user
///
/// A user with no merged ratings gets an empty context; whether the user
/// is known at all is decided by the IdentifierIndex, not here.
pub fn build_user_context(data_index: &DataIndex, user_id: &UserId) -> UserContext {
    let mut context = UserContext::new(user_id.clone());

    for rating in data_index.get_user_ratings(user_id) {
        context.rated_titles.insert(rating.title.clone());
        context.history.push(rating.clone());
    }

    context
}
