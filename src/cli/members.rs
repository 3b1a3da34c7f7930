use anyhow::{Result, anyhow, bail};

use crate::core::AppConfig;
use crate::google::{GoogleClient, GroupsApi};
use crate::output::print_members;

pub async fn run(
    config: &AppConfig,
    group: String,
    max: u32,
    page: Option<String>,
    json: bool,
) -> Result<()> {
    let group = group.trim();
    if group.is_empty() {
        bail!("Group email required");
    }

    let client = GoogleClient::new(config.access_token()?, config.request_timeout_secs)?;
    let groups = GroupsApi::new(client, &config.cloud_identity_api_url);

    let group_name = groups
        .lookup_group(group)
        .await
        .map_err(|e| anyhow!("Failed to find group {:?}: {}", group, e))?;
    let memberships = groups
        .list_memberships(&group_name, max, page.as_deref())
        .await
        .map_err(|e| anyhow!("Failed to list members: {}", e))?;

    print_members(group, &memberships, json)
}
