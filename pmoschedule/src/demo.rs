//! The built-in demo sequence, last tier of the resolution chain.

use chrono::DateTime;
use pmocontent::{ContentId, ContentItem, ContentPayload, MediaSource, TextSlide};

pub const DEMO_WELCOME_ID: &str = "demo-welcome";
pub const DEMO_PROMOTION_ID: &str = "demo-promotion";
pub const DEMO_HOURS_ID: &str = "demo-hours";

const HOURS_HTML: &str = r#"<div style="display: flex; flex-direction: column; justify-content: center; align-items: center; height: 100vh; background: linear-gradient(135deg, #667eea 0%, #764ba2 100%); color: white; text-align: center; font-family: 'Arial', sans-serif;">
  <h1 style="font-size: 4rem; margin-bottom: 2rem; font-weight: bold;">Horaires d'ouverture</h1>
  <div style="font-size: 2rem; line-height: 1.5;">
    <p>Lundi &agrave; vendredi : 8h00 &ndash; 18h00</p>
    <p>Samedi : 9h00 &ndash; 14h00</p>
    <p style="margin-top: 1rem; font-size: 1.5rem; opacity: 0.9;">&Agrave; bient&ocirc;t !</p>
  </div>
</div>"#;

/// The three canned slides every screen can fall back to: a welcome text,
/// a promotional photo, an hours-of-operation page. Fixed ids, fixed
/// order, fixed durations of 5, 8 and 6 seconds; repeated calls return
/// identical values so re-resolution never makes a demo screen flicker.
pub fn demo_sequence() -> Vec<ContentItem> {
    vec![
        ContentItem {
            id: ContentId::from(DEMO_WELCOME_ID),
            title: "Bienvenue".to_string(),
            payload: ContentPayload::Text(TextSlide::new("Bienvenue chez nous")),
            duration_secs: 5,
            is_active: true,
            created_at: DateTime::UNIX_EPOCH,
        },
        ContentItem {
            id: ContentId::from(DEMO_PROMOTION_ID),
            title: "Promotion du moment".to_string(),
            payload: ContentPayload::Image(MediaSource {
                url: Some(
                    "https://images.pexels.com/photos/4386431/pexels-photo-4386431.jpeg?auto=compress&cs=tinysrgb&w=1920&h=1080"
                        .to_string(),
                ),
                storage_path: None,
                alt: "Promotion en cours".to_string(),
                file_name: None,
                mime_type: Some("image/jpeg".to_string()),
                size_bytes: None,
            }),
            duration_secs: 8,
            is_active: true,
            created_at: DateTime::UNIX_EPOCH,
        },
        ContentItem {
            id: ContentId::from(DEMO_HOURS_ID),
            title: "Horaires d'ouverture".to_string(),
            payload: ContentPayload::Markup {
                html: HOURS_HTML.to_string(),
            },
            duration_secs: 6,
            is_active: true,
            created_at: DateTime::UNIX_EPOCH,
        },
    ]
}
