/// Game client started by the launcher.
pub const GAME_PROCESS: &str = "DeltaForceClient-Win64-Shipping.exe";

/// Anti-cheat process whose scheduling is restricted.
pub const ANTI_CHEAT_PROCESS: &str = "SGuard64.exe";

/// Service that respawns the anti-cheat process.
pub const ANTI_CHEAT_SERVICE: &str = "AntiCheatExpert Service";

/// Only file accepted as the configured game path.
pub const LAUNCHER_FILE: &str = "delta_force_launcher.exe";
