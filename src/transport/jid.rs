//! WhatsApp address (JID) helpers.

/// Chat id of the status broadcast channel.
pub const STATUS_BROADCAST: &str = "status@broadcast";

const GROUP_SERVER: &str = "g.us";
const USER_SERVER: &str = "s.whatsapp.net";

/// Canonical form of a user address.
///
/// Drops the device (`:14`) and agent (`_1`) suffixes and maps the legacy
/// `c.us` server to `s.whatsapp.net`, so the same account compares equal
/// regardless of which device it spoke from. Input without a server part
/// is returned trimmed.
pub fn normalize_jid(jid: &str) -> String {
    let jid = jid.trim();
    let Some((user, server)) = jid.split_once('@') else {
        return jid.to_string();
    };

    let user = user.split(':').next().unwrap_or(user);
    let user = user.split('_').next().unwrap_or(user);
    let server = if server == "c.us" { USER_SERVER } else { server };

    format!("{}@{}", user, server)
}

/// The part before `@` (phone number or linked id).
pub fn user_part(jid: &str) -> &str {
    jid.split('@').next().unwrap_or(jid)
}

pub fn is_group(jid: &str) -> bool {
    jid.ends_with(&format!("@{}", GROUP_SERVER))
}

/// Build a user address from free-form input such as `+62 811-222`.
///
/// Returns `None` when fewer than six digits remain.
pub fn from_number(input: &str) -> Option<String> {
    let digits: String = input.chars().filter(char::is_ascii_digit).collect();
    (digits.len() > 5).then(|| format!("{}@{}", digits, USER_SERVER))
}
