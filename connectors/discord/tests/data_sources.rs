//! Data source reads and provider configuration against a mock Discord API.

use serde_json::json;
use tfd_discord::DiscordProvider;
use tfd_testkit::{
    Diagnostics, MockApiServer, assert_err, assert_no_diagnostics, assert_ok, assert_warning,
    fixtures::discord, init_test_tracing,
};

async fn provider(mock: &MockApiServer) -> DiscordProvider {
    init_test_tracing();
    let mut provider = DiscordProvider::new();
    assert_ok(provider.configure(mock.provider_config()).await);
    provider
}

// ─────────────────────────────────────────────────────────────────────────────
// Configuration
// ─────────────────────────────────────────────────────────────────────────────

#[tokio::test]
async fn configure_verifies_the_token() {
    let mock = MockApiServer::start().await;
    mock.expect_get("/users/@me", discord::bot_user("42", "terraform-bot"))
        .await;

    let mut config = mock.provider_config();
    config["verify_token"] = json!(true);
    config["token"] = json!("Bot test-token");

    let mut provider = DiscordProvider::new();
    assert_ok(provider.configure(config).await);
    assert!(provider.data().is_configured());

    let request = &mock.requests_to("GET", "/users/@me").await[0];
    assert_eq!(
        request.headers.get("authorization").map(|v| v.to_str().unwrap()),
        Some("Bot test-token")
    );
}

#[tokio::test]
async fn rejected_token_fails_configuration() {
    let mock = MockApiServer::start().await;
    mock.expect_error("GET", "/users/@me", 401, 0, "401: Unauthorized")
        .await;

    let mut config = mock.provider_config();
    config["verify_token"] = json!(true);

    let mut provider = DiscordProvider::new();
    assert_err(provider.configure(config).await, "Unable to Verify Discord Token");
    assert!(!provider.data().is_configured());
}

// ─────────────────────────────────────────────────────────────────────────────
// Channels
// ─────────────────────────────────────────────────────────────────────────────

fn guild_channels() -> serde_json::Value {
    json!([
        discord::category("100", "1", "Ops"),
        discord::channel("101", "1", "alerts", 0, Some("100"), 1),
        discord::text_channel("102", "1", "general"),
    ])
}

#[tokio::test]
async fn channels_filter_by_category_name() {
    let mock = MockApiServer::start().await;
    mock.expect_get("/guilds/1/channels", guild_channels()).await;
    let provider = provider(&mock).await;

    let out = assert_ok(
        provider
            .read_data_source(
                "discord_channels",
                json!({ "guild_id": "1", "category_name": "Ops" }),
                &mut Diagnostics::new(),
            )
            .await,
    );
    assert_eq!(
        out["channels"],
        json!([{ "id": "101", "name": "alerts", "type": 0, "category_id": "100", "position": 1 }])
    );

    let all = assert_ok(
        provider
            .read_data_source("discord_channels", json!({ "guild_id": "1" }), &mut Diagnostics::new())
            .await,
    );
    assert_eq!(all["channels"].as_array().map(Vec::len), Some(3));
}

#[tokio::test]
async fn unknown_category_name_is_an_error() {
    let mock = MockApiServer::start().await;
    mock.expect_get("/guilds/1/channels", guild_channels()).await;
    let provider = provider(&mock).await;

    let err = assert_err(
        provider
            .read_data_source(
                "discord_channels",
                json!({ "guild_id": "1", "category_name": "Voice" }),
                &mut Diagnostics::new(),
            )
            .await,
        "Category Not Found",
    );
    assert_eq!(err.detail(), "No category channel found with name 'Voice' in guild 1");
}

#[tokio::test]
async fn category_lookup_by_name_or_id() {
    let mock = MockApiServer::start().await;
    mock.expect_get("/guilds/1/channels", guild_channels()).await;
    mock.expect_get("/channels/102", discord::text_channel("102", "1", "general"))
        .await;
    let provider = provider(&mock).await;

    let out = assert_ok(
        provider
            .read_data_source(
                "discord_category",
                json!({ "name": "Ops", "guild_id": "1" }),
                &mut Diagnostics::new(),
            )
            .await,
    );
    assert_eq!(out["id"], "100");

    assert_err(
        provider
            .read_data_source("discord_category", json!({ "category_id": "102" }), &mut Diagnostics::new())
            .await,
        "Invalid Channel Type",
    );

    assert_err(
        provider
            .read_data_source("discord_category", json!({ "name": "Ops" }), &mut Diagnostics::new())
            .await,
        "Missing Required Attributes",
    );
}

#[tokio::test]
async fn channel_reports_raw_type_code() {
    let mock = MockApiServer::start().await;
    mock.expect_get("/channels/101", discord::channel("101", "1", "alerts", 0, Some("100"), 1))
        .await;
    let provider = provider(&mock).await;

    let out = assert_ok(
        provider
            .read_data_source("discord_channel", json!({ "channel_id": "101" }), &mut Diagnostics::new())
            .await,
    );
    assert_eq!(out["type"], 0);
    assert_eq!(out["category_id"], "100");
    assert_eq!(out["guild_id"], "1");
}

// ─────────────────────────────────────────────────────────────────────────────
// Servers and roles
// ─────────────────────────────────────────────────────────────────────────────

#[tokio::test]
async fn server_and_servers() {
    let mock = MockApiServer::start().await;
    mock.expect_get("/guilds/1", discord::guild("1", "Guild", "42")).await;
    mock.expect_get(
        "/users/@me/guilds",
        json!([discord::partial_guild("1", "Guild", true), discord::partial_guild("2", "Other", false)]),
    )
    .await;
    let provider = provider(&mock).await;

    let server = assert_ok(
        provider
            .read_data_source("discord_server", json!({ "server_id": "1" }), &mut Diagnostics::new())
            .await,
    );
    assert_eq!(server["owner_id"], "42");
    assert_eq!(server["features"], json!(["COMMUNITY"]));

    let servers = assert_ok(
        provider
            .read_data_source("discord_servers", json!({}), &mut Diagnostics::new())
            .await,
    );
    assert_eq!(servers["servers"][0]["owner"], true);
    assert_eq!(servers["servers"][1]["permissions"], "2147483647");
}

#[tokio::test]
async fn role_lookup_by_name() {
    let mock = MockApiServer::start().await;
    mock.expect_get(
        "/guilds/1/roles",
        json!([discord::role("1", "@everyone", 0, 0), discord::role("20", "Mods", 4_360_181, 3)]),
    )
    .await;
    let provider = provider(&mock).await;

    let out = assert_ok(
        provider
            .read_data_source("discord_role", json!({ "name": "Mods", "guild_id": "1" }), &mut Diagnostics::new())
            .await,
    );
    assert_eq!(out["id"], "20");
    assert_eq!(out["color"], 4_360_181);
    assert_eq!(out["permissions"], 104_324_673);

    assert_err(
        provider
            .read_data_source("discord_role", json!({ "role_id": "99", "guild_id": "1" }), &mut Diagnostics::new())
            .await,
        "Role Not Found",
    );

    let roles = assert_ok(
        provider
            .read_data_source("discord_roles", json!({ "guild_id": "1" }), &mut Diagnostics::new())
            .await,
    );
    assert_eq!(roles["roles"].as_array().map(Vec::len), Some(2));
}

// ─────────────────────────────────────────────────────────────────────────────
// Members
// ─────────────────────────────────────────────────────────────────────────────

#[tokio::test]
async fn members_without_user_are_skipped_with_a_warning() {
    let mock = MockApiServer::start().await;
    mock.expect_get(
        "/guilds/1/members",
        json!([discord::member(discord::user("7", "ada"), &["20"]), { "roles": [] }]),
    )
    .await;
    let provider = provider(&mock).await;

    let mut diags = Diagnostics::new();
    let out = assert_ok(
        provider
            .read_data_source("discord_members", json!({ "guild_id": "1" }), &mut diags)
            .await,
    );
    assert_eq!(out["members"].as_array().map(Vec::len), Some(1));
    assert_eq!(out["members"][0]["username"], "ada");
    assert_eq!(out["members"][0]["joined_at"], "2024-03-01T12:30:00Z");
    assert_warning(&diags, "Skipping Member with Nil User");

    let request = &mock.requests_to("GET", "/guilds/1/members").await[0];
    assert_eq!(request.url.query(), Some("limit=1000"));
}

#[tokio::test]
async fn member_access_errors_explain_the_intent() {
    let mock = MockApiServer::start().await;
    mock.expect_error("GET", "/guilds/1/members/7", 403, 50001, "Missing Access")
        .await;
    let provider = provider(&mock).await;

    let err = assert_err(
        provider
            .read_data_source(
                "discord_member",
                json!({ "guild_id": "1", "user_id": "7" }),
                &mut Diagnostics::new(),
            )
            .await,
        "Error Fetching Member",
    );
    assert!(err.detail().contains("SERVER MEMBERS INTENT"));
}

// ─────────────────────────────────────────────────────────────────────────────
// Emojis and colors
// ─────────────────────────────────────────────────────────────────────────────

#[tokio::test]
async fn emoji_lookup_by_name() {
    let mock = MockApiServer::start().await;
    mock.expect_get("/guilds/1/emojis", json!([discord::emoji("30", "party", &["5"])]))
        .await;
    let provider = provider(&mock).await;

    let mut diags = Diagnostics::new();
    let out = assert_ok(
        provider
            .read_data_source("discord_emoji", json!({ "name": "party", "guild_id": "1" }), &mut diags)
            .await,
    );
    assert_eq!(out["id"], "30");
    assert_eq!(out["roles"], json!(["5"]));
    assert_eq!(out["user"], "7");
    assert_no_diagnostics(&diags);

    let err = assert_err(
        provider
            .read_data_source("discord_emoji", json!({ "name": "nope", "guild_id": "1" }), &mut Diagnostics::new())
            .await,
        "Emoji Not Found",
    );
    assert_eq!(err.detail(), "Emoji with name 'nope' was not found in guild 1.");
}

#[tokio::test]
async fn color_conversion_needs_no_network() {
    let mock = MockApiServer::start().await;
    let provider = provider(&mock).await;

    let out = assert_ok(
        provider
            .read_data_source("discord_color", json!({ "rgb": "rgb(66, 135, 245)" }), &mut Diagnostics::new())
            .await,
    );
    assert_eq!(out["dec"], 4_360_181);

    assert_err(
        provider
            .read_data_source("discord_color", json!({ "hex": "#fff", "rgb": "rgb(1,2,3)" }), &mut Diagnostics::new())
            .await,
        "Conflicting Color Input",
    );
    mock.assert_request_count(0).await;
}
