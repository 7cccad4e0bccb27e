//! Group instance fetcher: wire DTOs and their mapping to domain records

use chrono::{DateTime, FixedOffset};
use serde::Deserialize;

use crate::auth::API_BASE;
use crate::io::HttpClient;
use crate::model::Instance;

const LAUNCH_BASE: &str = "https://vrchat.com/home/launch?worldId=";

/// Placeholder title for worlds published without a name
const NO_TITLE: &str = "(NO TITLE)";

/// Display offset for world publication dates (UTC+9)
fn display_offset() -> FixedOffset {
    FixedOffset::east_opt(9 * 3600).expect("static offset")
}

#[derive(Debug, Deserialize)]
struct InstanceDto {
    #[serde(default, rename = "instanceId")]
    instance_id: Option<String>,
    #[serde(default)]
    world: Option<WorldDto>,
}

#[derive(Debug, Deserialize)]
struct WorldDto {
    #[serde(default)]
    id: Option<String>,
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    description: Option<String>,
    #[serde(default, rename = "thumbnailImageUrl")]
    thumbnail_image_url: Option<String>,
    #[serde(default)]
    created_at: Option<String>,
    #[serde(default)]
    popularity: Option<i64>,
    #[serde(default)]
    favorites: Option<i64>,
}

/// Fetch the group's live instances over an authenticated session.
///
/// Non-2xx responses fail the cycle; incomplete list entries do not.
pub async fn fetch_group_instances(
    http: &dyn HttpClient,
    group_id: &str,
) -> crate::Result<Vec<Instance>> {
    tracing::info!("Fetching group instances for group {}...", group_id);

    let url = format!("{}/groups/{}/instances", API_BASE, group_id);
    let response = http.get(&url).await?;
    if !response.is_success() {
        return Err(crate::WatchError::Fetch {
            status: response.status,
        });
    }

    parse_instances(&response.body)
}

fn parse_instances(body: &str) -> crate::Result<Vec<Instance>> {
    let entries: Vec<InstanceDto> = serde_json::from_str(body)?;

    let mut instances = Vec::new();
    for entry in entries {
        // The remote API occasionally returns records without the embedded
        // world object; those carry nothing worth notifying about.
        let Some(world) = entry.world else {
            tracing::debug!("Skipping instance entry without world data");
            continue;
        };

        let world_id = world.id.unwrap_or_default();
        let instance_id = entry.instance_id.unwrap_or_default();
        let world_name = match world.name {
            Some(name) if !name.trim().is_empty() => name,
            _ => NO_TITLE.to_string(),
        };

        instances.push(Instance {
            id: instance_id.clone(),
            world_name,
            world_url: format!("{}{}", LAUNCH_BASE, world_id),
            instance_url: format!("{}{}&instanceId={}", LAUNCH_BASE, world_id, instance_id),
            world_description: world.description,
            thumbnail_url: world.thumbnail_image_url,
            world_created_at: world.created_at.as_deref().and_then(parse_created_at),
            popularity: world.popularity,
            favorites: world.favorites,
        });
    }

    Ok(instances)
}

/// Parse the world publication timestamp (UTC on the wire) and shift it to
/// UTC+9 for display. Absent or unparsable values are dropped silently.
fn parse_created_at(raw: &str) -> Option<DateTime<FixedOffset>> {
    if raw.trim().is_empty() {
        return None;
    }
    match DateTime::parse_from_rfc3339(raw) {
        Ok(parsed) => Some(parsed.with_timezone(&display_offset())),
        Err(e) => {
            tracing::debug!("Unparsable world created_at {:?}: {}", raw, e);
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::io::{HttpResponse, MockHttpClient};
    use chrono::Timelike;
    use std::sync::Arc;

    fn instance_list_body() -> String {
        r#"[
            {
                "instanceId": "12345~group(grp_1)",
                "world": {
                    "id": "wrld_abc",
                    "name": "Night Cafe",
                    "description": "A quiet rooftop cafe",
                    "thumbnailImageUrl": "https://files.example/thumb.png",
                    "created_at": "2024-03-01T12:00:00Z",
                    "popularity": 7,
                    "favorites": 1234
                }
            },
            {
                "instanceId": "67890~group(grp_1)"
            },
            {
                "instanceId": "13579~group(grp_1)",
                "world": {
                    "id": "wrld_def",
                    "name": "   "
                }
            }
        ]"#
        .to_string()
    }

    #[tokio::test]
    async fn fetch_maps_entries_and_skips_worldless_ones() {
        let mut mock = MockHttpClient::new();
        mock.expect_get()
            .withf(|url| url.ends_with("/groups/grp_1/instances"))
            .returning(|_| {
                Box::pin(async {
                    Ok(HttpResponse {
                        status: 200,
                        body: instance_list_body(),
                    })
                })
            });

        let http: Arc<dyn HttpClient> = Arc::new(mock);
        let instances = fetch_group_instances(http.as_ref(), "grp_1").await.unwrap();

        assert_eq!(instances.len(), 2);
        assert_eq!(instances[0].id, "12345~group(grp_1)");
        assert_eq!(instances[0].world_name, "Night Cafe");
        assert_eq!(
            instances[0].world_url,
            "https://vrchat.com/home/launch?worldId=wrld_abc"
        );
        assert_eq!(
            instances[0].instance_url,
            "https://vrchat.com/home/launch?worldId=wrld_abc&instanceId=12345~group(grp_1)"
        );
        assert_eq!(instances[0].popularity, Some(7));
        assert_eq!(instances[0].favorites, Some(1234));
    }

    #[tokio::test]
    async fn fetch_fails_with_status_on_non_2xx() {
        let mut mock = MockHttpClient::new();
        mock.expect_get().returning(|_| {
            Box::pin(async {
                Ok(HttpResponse {
                    status: 403,
                    body: "forbidden".to_string(),
                })
            })
        });

        let http: Arc<dyn HttpClient> = Arc::new(mock);
        let err = fetch_group_instances(http.as_ref(), "grp_1")
            .await
            .unwrap_err();
        match err {
            crate::WatchError::Fetch { status } => assert_eq!(status, 403),
            other => panic!("expected WatchError::Fetch, got {other:?}"),
        }
    }

    #[test]
    fn blank_world_name_gets_placeholder() {
        let instances = parse_instances(&instance_list_body()).unwrap();
        assert_eq!(instances[1].world_name, "(NO TITLE)");
    }

    #[test]
    fn created_at_is_shifted_to_utc_plus_9() {
        let instances = parse_instances(&instance_list_body()).unwrap();
        let created = instances[0].world_created_at.unwrap();
        assert_eq!(created.hour(), 21);
        assert_eq!(created.offset().local_minus_utc(), 9 * 3600);
    }

    #[test]
    fn unparsable_created_at_is_dropped() {
        let body = r#"[{
            "instanceId": "1",
            "world": { "id": "wrld_x", "name": "X", "created_at": "last tuesday" }
        }]"#;
        let instances = parse_instances(body).unwrap();
        assert_eq!(instances[0].world_created_at, None);
    }

    #[test]
    fn empty_list_parses_to_no_instances() {
        let instances = parse_instances("[]").unwrap();
        assert!(instances.is_empty());
    }

    #[test]
    fn invalid_json_is_an_error() {
        assert!(parse_instances("not json").is_err());
    }
}
