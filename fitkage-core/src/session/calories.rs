/// Flat-rate estimate: whole minutes times a per-minute constant.
pub fn calories_burned(duration_ms: u64, calories_per_minute: u32) -> u32 {
    let minutes = duration_ms / 60_000;
    let calories = minutes.saturating_mul(u64::from(calories_per_minute));
    u32::try_from(calories).unwrap_or(u32::MAX)
}
