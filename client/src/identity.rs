//! Random participant and stroke identifiers

use rand::Rng;
use shared::{now_millis, USER_PALETTE};

const USER_ID_LEN: usize = 9;

/// Who this client is in the room.
#[derive(Debug, Clone, PartialEq)]
pub struct Identity {
    pub user_id: String,
    pub user_name: Option<String>,
    pub user_color: String,
}

impl Identity {
    /// Fills in whatever was not given explicitly.
    pub fn resolve<R: Rng>(
        rng: &mut R,
        user_id: Option<String>,
        user_name: Option<String>,
        user_color: Option<String>,
    ) -> Self {
        Self {
            user_id: user_id.unwrap_or_else(|| generate_user_id(rng)),
            user_name,
            user_color: user_color.unwrap_or_else(|| pick_color(rng).to_string()),
        }
    }
}

/// `user-` followed by nine lowercase base36 characters.
pub fn generate_user_id<R: Rng>(rng: &mut R) -> String {
    let suffix: String = (0..USER_ID_LEN)
        .filter_map(|_| std::char::from_digit(rng.gen_range(0..36), 36))
        .collect();
    format!("user-{}", suffix)
}

pub fn generate_stroke_id<R: Rng>(rng: &mut R) -> String {
    format!("stroke-{}-{}", now_millis(), rng.gen::<u32>())
}

pub fn pick_color<R: Rng>(rng: &mut R) -> &'static str {
    USER_PALETTE[rng.gen_range(0..USER_PALETTE.len())]
}
