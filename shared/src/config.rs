/// Frame counts a match can be configured with.
pub const FRAME_OPTIONS: [u32; 4] = [1, 3, 5, 7];

/// Physics tuning. Velocities are table units per tick.
#[derive(Debug, Clone, Copy, serde::Serialize, serde::Deserialize, ts_rs::TS)]
#[ts(export, export_to = "../../client/src/shared/generated/")]
#[serde(rename_all = "camelCase")]
pub struct PhysicsConfig {
    /// Integration increments per tick
    pub sub_steps: u32,
    /// Constant speed loss per tick (rolling friction on the cloth)
    pub deceleration: f64,
    /// Fraction of the normal velocity kept after a cushion bounce
    pub wall_bounce: f64,
    /// Ball-ball restitution coefficient
    pub ball_restitution: f64,
    /// Speeds below this snap to zero
    pub stop_threshold: f64,
    pub max_power: f64,
    /// Shots at or below this power are discarded
    pub min_power: f64,
    /// Power to launch speed
    pub shot_scale: f64,
    /// Pocket capture radius multiplier
    pub pocket_capture_scale: f64,
}

impl Default for PhysicsConfig {
    fn default() -> Self {
        Self {
            sub_steps: 8,
            deceleration: 0.045,
            wall_bounce: 0.75,
            ball_restitution: 0.92,
            stop_threshold: 0.08,
            max_power: 45.0,
            min_power: 1.0,
            shot_scale: 0.85,
            pocket_capture_scale: 1.2,
        }
    }
}

impl PhysicsConfig {
    pub fn validate(&self) -> Result<(), String> {
        if self.sub_steps == 0 {
            return Err("sub_steps must be >= 1".to_string());
        }
        if !self.deceleration.is_finite() || self.deceleration <= 0.0 {
            return Err("deceleration must be finite and > 0".to_string());
        }
        if !self.wall_bounce.is_finite() || !(0.0..=1.0).contains(&self.wall_bounce) {
            return Err("wall_bounce must be within [0, 1]".to_string());
        }
        if !self.ball_restitution.is_finite() || !(0.0..=1.0).contains(&self.ball_restitution) {
            return Err("ball_restitution must be within [0, 1]".to_string());
        }
        if !self.stop_threshold.is_finite() || self.stop_threshold < 0.0 {
            return Err("stop_threshold must be finite and >= 0".to_string());
        }
        if !self.max_power.is_finite() || self.max_power <= self.min_power {
            return Err("max_power must be finite and > min_power".to_string());
        }
        if !self.min_power.is_finite() || self.min_power < 0.0 {
            return Err("min_power must be finite and >= 0".to_string());
        }
        if !self.shot_scale.is_finite() || self.shot_scale <= 0.0 {
            return Err("shot_scale must be finite and > 0".to_string());
        }
        if !self.pocket_capture_scale.is_finite() || self.pocket_capture_scale <= 0.0 {
            return Err("pocket_capture_scale must be finite and > 0".to_string());
        }
        Ok(())
    }
}

/// Rule variant played in every frame of a match.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize, ts_rs::TS)]
#[ts(export, export_to = "../../client/src/shared/generated/")]
pub enum GameMode {
    #[serde(rename = "8BALL")]
    EightBall,
    #[serde(rename = "9BALL")]
    NineBall,
}

impl GameMode {
    /// Tag stored with match results
    pub fn tag(&self) -> &'static str {
        match self {
            GameMode::EightBall => "8BALL",
            GameMode::NineBall => "9BALL",
        }
    }
}

/// Best-of-N match settings, fixed before the first frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize, ts_rs::TS)]
#[ts(export, export_to = "../../client/src/shared/generated/")]
#[serde(rename_all = "camelCase")]
pub struct MatchConfig {
    pub frames_to_play: u32,
    /// Stake moved from loser to winner
    pub points_per_match: u32,
    /// Award the 8-ball pot to the shooter only once the table is otherwise
    /// clear. Off: any 8-ball pot wins for the shooter.
    #[serde(default)]
    pub eight_ball_requires_clear: bool,
}

impl Default for MatchConfig {
    fn default() -> Self {
        Self {
            frames_to_play: 3,
            points_per_match: 100,
            eight_ball_requires_clear: false,
        }
    }
}

impl MatchConfig {
    /// Frames needed to win the match
    pub fn frames_to_win(&self) -> u32 {
        self.frames_to_play.div_ceil(2)
    }

    pub fn validate(&self) -> Result<(), String> {
        if !FRAME_OPTIONS.contains(&self.frames_to_play) {
            return Err(format!(
                "frames_to_play must be one of {:?}",
                FRAME_OPTIONS
            ));
        }
        Ok(())
    }
}
