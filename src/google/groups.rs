//! Cloud Identity Groups API: group lookup and membership listing
use anyhow::{Error, Result, anyhow};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use super::client::GoogleClient;
use crate::team::{MemberIdentity, MembershipResolver};

/// Largest page size the memberships endpoint accepts for basic views
const MEMBERSHIPS_PAGE_SIZE: u32 = 200;

#[derive(Debug, Deserialize)]
pub struct LookupGroupResponse {
    pub name: String,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct EntityKey {
    pub id: String,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct MembershipRole {
    pub name: String,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Membership {
    pub preferred_member_key: Option<EntityKey>,
    #[serde(rename = "type", default)]
    pub kind: String,
    #[serde(default)]
    pub roles: Vec<MembershipRole>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MembershipsPage {
    #[serde(default)]
    pub memberships: Vec<Membership>,
    pub next_page_token: Option<String>,
}

impl Membership {
    /// Email of a user member. Nested groups, service accounts and
    /// customer-wide entries are not calendar owners.
    pub fn user_email(&self) -> Option<&str> {
        let id = self.preferred_member_key.as_ref()?.id.as_str();
        (self.kind == "USER" && id.contains('@')).then_some(id)
    }
}

/// Highest role held by a member: OWNER > MANAGER > MEMBER
pub fn member_role(roles: &[MembershipRole]) -> &'static str {
    if roles.iter().any(|r| r.name == "OWNER") {
        "OWNER"
    } else if roles.iter().any(|r| r.name == "MANAGER") {
        "MANAGER"
    } else {
        "MEMBER"
    }
}

/// Add remediation hints to the most common Cloud Identity failures
pub fn wrap_cloud_identity_error(err: Error) -> Error {
    let msg = err.to_string();
    if msg.contains("accessNotConfigured") || msg.contains("Cloud Identity API has not been used")
    {
        return anyhow!(
            "Cloud Identity API is not enabled; enable it at: https://console.developers.google.com/apis/api/cloudidentity.googleapis.com/overview ({})",
            msg
        );
    }
    if msg.contains("insufficientPermissions") || msg.contains("insufficient authentication scopes")
    {
        return anyhow!(
            "Insufficient permissions for Cloud Identity API; re-authenticate with the cloud-identity.groups.readonly scope ({})",
            msg
        );
    }
    err
}

pub struct GroupsApi {
    client: GoogleClient,
    base_url: String,
}

impl GroupsApi {
    pub fn new(client: GoogleClient, base_url: &str) -> Self {
        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    /// Resolve a group email to its resource name, e.g. `groups/abc123`
    pub async fn lookup_group(&self, group_email: &str) -> Result<String> {
        let url = format!("{}/groups:lookup", self.base_url);
        let resp: LookupGroupResponse = self
            .client
            .get_json(&url, &[("groupKey.id", group_email.to_string())])
            .await
            .map_err(wrap_cloud_identity_error)?;
        Ok(resp.name)
    }

    pub async fn list_memberships(
        &self,
        group_name: &str,
        page_size: u32,
        page_token: Option<&str>,
    ) -> Result<MembershipsPage> {
        let url = format!("{}/{}/memberships", self.base_url, group_name);
        let mut query = vec![("pageSize", page_size.to_string())];
        if let Some(token) = page_token.filter(|t| !t.is_empty()) {
            query.push(("pageToken", token.to_string()));
        }
        self.client
            .get_json(&url, &query)
            .await
            .map_err(wrap_cloud_identity_error)
    }

    /// Flat list of user member emails for a group, following pagination
    pub async fn resolve_members(&self, group_email: &str) -> Result<Vec<MemberIdentity>> {
        let group_name = self
            .lookup_group(group_email)
            .await
            .map_err(|e| anyhow!("Failed to find group {:?}: {}", group_email, e))?;

        let mut members = Vec::new();
        let mut page_token: Option<String> = None;
        loop {
            let page = self
                .list_memberships(&group_name, MEMBERSHIPS_PAGE_SIZE, page_token.as_deref())
                .await
                .map_err(|e| anyhow!("Failed to list group members: {}", e))?;

            members.extend(
                page.memberships
                    .iter()
                    .filter_map(|m| m.user_email())
                    .map(str::to_string),
            );

            match page.next_page_token.filter(|t| !t.is_empty()) {
                Some(token) => page_token = Some(token),
                None => break,
            }
        }

        tracing::debug!("Resolved {} members for {}", members.len(), group_email);
        Ok(members)
    }
}

#[async_trait]
impl MembershipResolver for GroupsApi {
    async fn resolve_members(&self, group: &str) -> Result<Vec<MemberIdentity>> {
        GroupsApi::resolve_members(self, group).await
    }
}
