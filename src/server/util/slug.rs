use chrono::{DateTime, Utc};

/// Maximum length of a derived guild ID.
const MAX_SLUG_LEN: usize = 32;

/// Derives a guild ID from its display name.
///
/// The name is lowercased, every run of non-alphanumeric characters becomes a single
/// `-`, and leading/trailing dashes are trimmed. Names that normalize to nothing (for
/// example only emoji or punctuation) fall back to `guild-<unix millis>` so creation
/// still yields a deterministic, non-empty ID for that instant.
///
/// # Arguments
/// - `name` - Display name entered by the user
/// - `now` - Current time, used only for the fallback ID
///
/// # Returns
/// - `String` - Slug suitable as a primary key
pub fn derive_guild_id(name: &str, now: DateTime<Utc>) -> String {
    let mut slug = String::with_capacity(name.len());
    let mut pending_dash = false;

    for c in name.chars() {
        if c.is_ascii_alphanumeric() {
            if pending_dash && !slug.is_empty() {
                slug.push('-');
            }
            pending_dash = false;
            slug.push(c.to_ascii_lowercase());
        } else {
            pending_dash = true;
        }

        if slug.len() >= MAX_SLUG_LEN {
            break;
        }
    }

    slug.truncate(MAX_SLUG_LEN);
    let slug = slug.trim_end_matches('-').to_string();

    if slug.is_empty() {
        format!("guild-{}", now.timestamp_millis())
    } else {
        slug
    }
}
