// Copyright (c) Hedera Bridge Contributors
// SPDX-License-Identifier: Apache-2.0

use tokio::sync::RwLock;

/// Router governance members, replaced as a whole on every reload.
#[derive(Debug, Default)]
pub struct GovernanceMembers {
    members: RwLock<Vec<String>>,
}

impl GovernanceMembers {
    pub async fn set(&self, members: Vec<String>) {
        let members = members.into_iter().map(|m| m.to_lowercase()).collect();
        *self.members.write().await = members;
    }

    pub async fn get(&self) -> Vec<String> {
        self.members.read().await.clone()
    }

    pub async fn contains(&self, member: &str) -> bool {
        let member = member.to_lowercase();
        self.members.read().await.iter().any(|m| *m == member)
    }
}
