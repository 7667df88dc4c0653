//! Narrow interfaces to the systems this core consumes but does not own.
//!
//! Authentication and the friend graph live elsewhere; services only ever see these traits.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};

use crate::ids::UserId;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserProfile {
    pub id: UserId,
    pub display_name: String,
}

/// The authenticated-user collaborator.
pub trait Session: Send + Sync {
    /// `None` when nobody is signed in.
    fn current_user(&self) -> Option<UserProfile>;
}

/// The friend-graph collaborator.
#[async_trait]
pub trait FriendGraph: Send + Sync {
    async fn friend_ids(&self, user: UserId) -> anyhow::Result<HashSet<UserId>>;
}

/// A session pinned to one user.
#[derive(Debug, Clone)]
pub struct StaticSession {
    user: Option<UserProfile>,
}

impl StaticSession {
    pub fn signed_in(user: UserProfile) -> Self {
        Self { user: Some(user) }
    }

    pub fn signed_out() -> Self {
        Self { user: None }
    }
}

impl Session for StaticSession {
    fn current_user(&self) -> Option<UserProfile> {
        self.user.clone()
    }
}

/// Friend graph backed by a fixed adjacency map.
#[derive(Debug, Clone, Default)]
pub struct StaticFriendGraph {
    edges: HashMap<UserId, HashSet<UserId>>,
}

impl StaticFriendGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a mutual friendship.
    pub fn befriend(mut self, a: UserId, b: UserId) -> Self {
        self.edges.entry(a).or_default().insert(b);
        self.edges.entry(b).or_default().insert(a);
        self
    }

    /// Friend list for one user, as given (not mirrored).
    pub fn with_friends(mut self, user: UserId, friends: impl IntoIterator<Item = UserId>) -> Self {
        self.edges.entry(user).or_default().extend(friends);
        self
    }
}

#[async_trait]
impl FriendGraph for StaticFriendGraph {
    async fn friend_ids(&self, user: UserId) -> anyhow::Result<HashSet<UserId>> {
        Ok(self.edges.get(&user).cloned().unwrap_or_default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_befriend_is_mutual() {
        let (a, b) = (UserId::new(), UserId::new());
        let graph = StaticFriendGraph::new().befriend(a, b);
        assert!(graph.friend_ids(a).await.unwrap().contains(&b));
        assert!(graph.friend_ids(b).await.unwrap().contains(&a));
        assert!(graph.friend_ids(UserId::new()).await.unwrap().is_empty());
    }
}
