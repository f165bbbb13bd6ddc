use std::sync::Arc;

use httpmock::prelude::*;
use weatherbot_core::{
    MemoryPreferenceStore, PreferenceStore, Reply, ServerConfig, Units, WeatherBot,
    prefs::PreferenceValue,
};

fn test_config() -> ServerConfig {
    ServerConfig {
        weather_provider: "test".into(),
        ..Default::default()
    }
}

fn bot_with(config: ServerConfig) -> (WeatherBot, Arc<MemoryPreferenceStore>) {
    let store = Arc::new(MemoryPreferenceStore::new());
    let bot = WeatherBot::from_config(config, store.clone()).unwrap();
    (bot, store)
}

fn text(reply: &Reply) -> &str {
    reply.as_text().expect("text reply")
}

#[tokio::test]
async fn weather_with_test_provider_hides_link_by_default() {
    let (bot, _) = bot_with(test_config());

    let replies = bot.weather("@a", "Anywhere").await;

    assert_eq!(replies.len(), 1);
    assert_eq!(
        text(&replies[0]),
        "Anywhere: 22°C, Sunny with test clouds, Humidity: 50%, Wind: 8 km/h\n\
         Forecast: Sunny day in Anywhere"
    );
}

#[tokio::test]
async fn inline_options_beat_stored_preferences() {
    let (bot, store) = bot_with(test_config());
    store.save("@a", "units", PreferenceValue::Text("m".into())).await.unwrap();
    store.save("@a", "language", PreferenceValue::Text("en".into())).await.unwrap();

    let replies = bot.weather("@a", "Madrid u:u l:es").await;
    let msg = text(&replies[0]);

    assert!(msg.contains("72°F"), "{msg}");
    assert!(msg.starts_with("Madrid: "), "{msg}");
    assert!(msg.contains("Día soleado en Madrid"), "{msg}");
}

#[tokio::test]
async fn stored_units_apply_without_inline_options() {
    let (bot, store) = bot_with(test_config());
    store.save("@a", "units", PreferenceValue::Text("u".into())).await.unwrap();

    let replies = bot.weather("@a", "").await;
    assert!(text(&replies[0]).contains("5 mph"));

    // Someone else still gets the server default.
    let replies = bot.weather("@b", "").await;
    assert!(text(&replies[0]).contains("8 km/h"));
}

#[tokio::test]
async fn options_only_input_uses_stored_location() {
    let config = ServerConfig {
        default_location: "Madrid".into(),
        ..test_config()
    };
    let (bot, _) = bot_with(config);

    let replies = bot.weather("@a", "u:u").await;
    assert!(text(&replies[0]).starts_with("Madrid: 72°F"), "{}", text(&replies[0]));

    bot.pref("@a", Some("location"), Some("Lisbon")).await;
    let replies = bot.weather("@a", "").await;
    assert!(text(&replies[0]).ends_with("Sunny day in Lisbon"), "{}", text(&replies[0]));

    let (bot, _) = bot_with(test_config());
    let replies = bot.weather("@a", "").await;
    assert!(text(&replies[0]).starts_with("TestCity: "), "{}", text(&replies[0]));
}

#[tokio::test]
async fn show_link_preference_adds_source() {
    let (bot, _) = bot_with(test_config());

    let reply = bot.pref("@a", Some("show_link"), Some("YES")).await;
    assert_eq!(text(&reply), "Preference 'show_link' set to 'true' for you.");

    let replies = bot.weather("@a", "x").await;
    assert!(text(&replies[0]).ends_with(" ([source](https://example.com/test-weather))"));
}

#[tokio::test]
async fn pref_view_annotates_sources_and_clear_resets() {
    let config = ServerConfig {
        default_units: Some(Units::Metric),
        ..test_config()
    };
    let (bot, _) = bot_with(config);

    bot.pref("@a", Some("units"), Some("u")).await;
    bot.pref("@a", Some("location"), Some("New York")).await;

    let view = bot.pref("@a", None, None).await;
    let view = text(&view);
    assert!(view.starts_with("Your preferences (including defaults):\n"));
    assert!(view.contains("units: u (your setting)"), "{view}");
    assert!(view.contains("location: New York (your setting)"), "{view}");
    assert!(view.contains("provider: test (server default)"), "{view}");

    let cleared = bot.pref("@a", Some("clear"), None).await;
    assert_eq!(
        text(&cleared),
        "Your weather preferences have been cleared (server defaults will be used)."
    );

    let view = bot.pref("@a", None, None).await;
    let view = text(&view);
    assert!(view.contains("units: m (server default)"), "{view}");
    assert!(!view.contains("your setting"), "{view}");
}

#[tokio::test]
async fn pref_rejects_bad_input() {
    let (bot, store) = bot_with(test_config());

    let reply = bot.pref("@a", Some("show_forecast"), Some("on")).await;
    assert_eq!(
        text(&reply),
        "Unknown preference 'show_forecast'. Valid options: location, units, language, \
         show_image, show_link, show_plus_sign, provider"
    );

    let reply = bot.pref("@a", Some("units"), None).await;
    assert_eq!(text(&reply), "Please provide a value for 'units'.");

    let reply = bot.pref("@a", Some("units"), Some("kelvin")).await;
    assert!(text(&reply).contains("Valid units: m, u, M"));

    let reply = bot.pref("@a", Some("provider"), Some("accuweather")).await;
    assert_eq!(
        text(&reply),
        "Unknown provider: accuweather. Available providers: wttr.in, test"
    );

    assert_eq!(store.get("@a").await.unwrap(), None);
}

#[tokio::test]
async fn provider_switch_is_per_user_and_persisted() {
    let (bot, store) = bot_with(ServerConfig::default());

    let reply = bot.provider("@a", None).await;
    assert_eq!(
        text(&reply),
        "Current provider: wttr.in\nAvailable providers: wttr.in, test"
    );

    let reply = bot.provider("@a", Some("test")).await;
    assert_eq!(text(&reply), "Weather provider set to test for you.");
    assert_eq!(
        store.get("@a").await.unwrap().unwrap().provider.as_deref(),
        Some("test")
    );

    let reply = bot.provider("@a", None).await;
    assert!(text(&reply).starts_with("Current provider: test\n"));

    let reply = bot.provider("@b", None).await;
    assert!(text(&reply).starts_with("Current provider: wttr.in\n"));
}

#[tokio::test]
async fn unknown_provider_leaves_current_unchanged() {
    let (bot, store) = bot_with(test_config());

    let reply = bot.provider("@a", Some("darksky")).await;

    assert_eq!(
        text(&reply),
        "Unknown provider: darksky. Available providers: wttr.in, test"
    );
    assert_eq!(store.get("@a").await.unwrap(), None);
    assert!(text(&bot.provider("@a", None).await).starts_with("Current provider: test\n"));
}

#[tokio::test]
async fn unknown_configured_provider_falls_back_to_wttr_in() {
    let server = MockServer::start();
    let mock = server.mock(|when, then| {
        when.method(GET).path("/Oslo").query_param("format", "3");
        then.status(200).body("Oslo: +5°C");
    });
    let config = ServerConfig {
        weather_provider: "no-such-provider".into(),
        service_url: server.base_url(),
        ..Default::default()
    };
    let (bot, _) = bot_with(config);

    let replies = bot.weather("@a", "Oslo").await;

    mock.assert();
    assert_eq!(text(&replies[0]), "Oslo: 5°C");
}

#[tokio::test]
async fn moon_uses_effective_provider() {
    let (bot, _) = bot_with(test_config());
    assert_eq!(text(&bot.moon("@a").await), "🌔 Test Moon (42% Illuminated)");
}

#[tokio::test]
async fn wttr_in_weather_with_image_and_link() {
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(GET).path("/Chicago").query_param("format", "3");
        then.status(200).body("Chicago: ☀️  +22°C\n");
    });
    let image = server.mock(|when, then| {
        when.method(GET).path("/Chicago.png").query_param_exists("m");
        then.status(200).body(b"png-bytes".to_vec());
    });
    let config = ServerConfig {
        service_url: server.base_url(),
        show_image: true,
        show_link: true,
        ..Default::default()
    };
    let (bot, _) = bot_with(config);

    let replies = bot.weather("@a", "Chicago u:m").await;

    image.assert();
    assert_eq!(replies.len(), 2);
    assert_eq!(
        text(&replies[0]),
        format!("Chicago: ☀️  22°C ([source]({}/Chicago?m))", server.base_url())
    );
    assert_eq!(
        replies[1],
        Reply::Image {
            filename: "Chicago.png".into(),
            data: b"png-bytes".to_vec(),
        }
    );
}

#[tokio::test]
async fn wttr_in_falls_back_to_default_location() {
    let server = MockServer::start();
    let madrid = server.mock(|when, then| {
        when.method(GET)
            .path("/Madrid")
            .query_param_exists("m")
            .query_param("format", "3");
        then.status(200).body("Madrid: ☀️  +30°C");
    });
    let config = ServerConfig {
        service_url: server.base_url(),
        default_location: "Madrid".into(),
        ..Default::default()
    };
    let (bot, _) = bot_with(config);

    let replies = bot.weather("@a", "u:m").await;

    madrid.assert();
    assert_eq!(text(&replies[0]), "Madrid: ☀️  30°C");
}

#[tokio::test]
async fn wttr_in_stored_location_beats_server_default() {
    let server = MockServer::start();
    let oslo = server.mock(|when, then| {
        when.method(GET).path("/Oslo").query_param("format", "3");
        then.status(200).body("Oslo: ❄️  -3°C");
    });
    let madrid = server.mock(|when, then| {
        when.method(GET).path("/Madrid");
        then.status(200).body("Madrid: ☀️  +30°C");
    });
    let config = ServerConfig {
        service_url: server.base_url(),
        default_location: "Madrid".into(),
        ..Default::default()
    };
    let (bot, _) = bot_with(config);

    bot.pref("@a", Some("location"), Some("Oslo")).await;
    let replies = bot.weather("@a", "").await;

    oslo.assert();
    assert_eq!(madrid.calls(), 0);
    assert_eq!(text(&replies[0]), "Oslo: ❄️  -3°C");
}

#[tokio::test]
async fn options_inside_stored_location_are_parsed() {
    let server = MockServer::start();
    let chicago = server.mock(|when, then| {
        when.method(GET)
            .path("/Chicago")
            .query_param_exists("u")
            .query_param("lang", "de")
            .query_param("format", "3");
        then.status(200).body("Chicago: ⛅️  +55°F");
    });
    let (bot, store) = bot_with(ServerConfig {
        service_url: server.base_url(),
        ..Default::default()
    });
    store.save("@a", "units", PreferenceValue::Text("m".into())).await.unwrap();
    bot.pref("@a", Some("location"), Some("Chicago u:u")).await;

    // Inline language still wins; units come from the stored location text.
    let replies = bot.weather("@a", "l:de").await;

    chicago.assert();
    assert_eq!(text(&replies[0]), "Chicago: ⛅️  55°F");
}

#[tokio::test]
async fn no_image_without_a_concrete_location() {
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(GET).path("/").query_param("format", "3");
        then.status(200).body("Somewhere: 🌧  +8°C");
    });
    let image = server.mock(|when, then| {
        when.method(GET).path("/.png");
        then.status(200).body("png");
    });
    let config = ServerConfig {
        service_url: server.base_url(),
        show_image: true,
        ..Default::default()
    };
    let (bot, _) = bot_with(config);

    let replies = bot.weather("@a", "u:m").await;

    assert_eq!(replies.len(), 1);
    assert_eq!(image.calls(), 0);
}

#[tokio::test]
async fn image_failure_still_sends_text() {
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(GET).path("/Oslo");
        then.status(200).body("Oslo: +1°C");
    });
    server.mock(|when, then| {
        when.method(GET).path("/Oslo.png");
        then.status(502);
    });
    let config = ServerConfig {
        service_url: server.base_url(),
        show_image: true,
        ..Default::default()
    };
    let (bot, _) = bot_with(config);

    let replies = bot.weather("@a", "Oslo").await;

    assert_eq!(replies, vec![Reply::text("Oslo: 1°C")]);
}

#[tokio::test]
async fn unknown_location_gets_a_note() {
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(GET).path("/Atlantis");
        then.status(404)
            .body("Unknown location; please try ~40.7,-74.0");
    });
    let config = ServerConfig {
        service_url: server.base_url(),
        ..Default::default()
    };
    let (bot, _) = bot_with(config);

    let replies = bot.weather("@a", "Atlantis").await;
    let msg = text(&replies[0]);

    assert!(msg.starts_with("Atlantis: Unknown location; please try"), "{msg}");
    assert!(msg.contains("\nNote: An 'unknown location' likely indicates"), "{msg}");
}

#[tokio::test]
async fn fetch_failures_become_chat_messages() {
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(GET).path("/Oslo");
        then.status(500).body("boom");
    });
    server.mock(|when, then| {
        when.method(GET).path("/");
        then.status(500).body("boom");
    });
    let config = ServerConfig {
        service_url: server.base_url(),
        ..Default::default()
    };
    let (bot, _) = bot_with(config);

    let replies = bot.weather("@a", "Oslo").await;
    assert!(text(&replies[0]).starts_with("Error getting weather: "));

    let reply = bot.moon("@a").await;
    assert!(text(&reply).starts_with("Error getting moon phase: "));
}

#[tokio::test]
async fn help_mentions_every_subcommand() {
    let (bot, _) = bot_with(test_config());
    let help = bot.help();
    let help = text(&help);

    for needle in [
        "u:<unit>",
        "l:<language-code>",
        "weather provider",
        "weather pref clear",
        "!moon",
    ] {
        assert!(help.contains(needle), "missing {needle}");
    }
}
