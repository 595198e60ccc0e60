//! Per-subsystem verbosity levels.

use crate::levels::Subsystem;

/// Verbosity level for every tracing subsystem.
///
/// Level 0 leaves only warnings and errors, 1 enables `info`, 2 enables
/// `debug` and anything higher enables `trace`.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct VerbosityConfig {
    /// Save path.
    pub save: u8,
    /// Restore path.
    pub restore: u8,
    /// Change-detection table.
    pub accurate: u8,
    /// ACL backends.
    pub acl: u8,
    /// Xattr backends.
    pub xattr: u8,
    /// Packet framing.
    pub wire: u8,
    /// Keep-alive monitor.
    pub heartbeat: u8,
}

impl VerbosityConfig {
    /// Creates a configuration from a `-v` count.
    #[must_use]
    pub fn from_verbose_level(level: u8) -> Self {
        let mut config = Self::default();
        match level {
            0 => {}
            1 => {
                config.save = 1;
                config.restore = 1;
                config.accurate = 1;
            }
            2 => {
                config.save = 2;
                config.restore = 2;
                config.accurate = 2;
                config.acl = 1;
                config.xattr = 1;
                config.heartbeat = 1;
            }
            3 => {
                for subsystem in Subsystem::ALL {
                    config.set(subsystem, 2);
                }
            }
            _ => {
                for subsystem in Subsystem::ALL {
                    config.set(subsystem, 3);
                }
            }
        }
        config
    }

    /// Returns the level of `subsystem`.
    #[must_use]
    pub const fn get(&self, subsystem: Subsystem) -> u8 {
        match subsystem {
            Subsystem::Save => self.save,
            Subsystem::Restore => self.restore,
            Subsystem::Accurate => self.accurate,
            Subsystem::Acl => self.acl,
            Subsystem::Xattr => self.xattr,
            Subsystem::Wire => self.wire,
            Subsystem::Heartbeat => self.heartbeat,
        }
    }

    /// Sets the level of `subsystem`.
    pub fn set(&mut self, subsystem: Subsystem, level: u8) {
        let slot = match subsystem {
            Subsystem::Save => &mut self.save,
            Subsystem::Restore => &mut self.restore,
            Subsystem::Accurate => &mut self.accurate,
            Subsystem::Acl => &mut self.acl,
            Subsystem::Xattr => &mut self.xattr,
            Subsystem::Wire => &mut self.wire,
            Subsystem::Heartbeat => &mut self.heartbeat,
        };
        *slot = level;
    }

    /// Applies a single flag token such as `acl2` or `restore`.
    ///
    /// A token without digits sets level 1. `all` applies to every subsystem.
    pub fn apply_flag(&mut self, token: &str) -> Result<(), String> {
        let (name, level) = parse_flag_token(token)?;
        if name == "all" {
            for subsystem in Subsystem::ALL {
                self.set(subsystem, level);
            }
            return Ok(());
        }
        let subsystem =
            Subsystem::from_name(name).ok_or_else(|| format!("unknown subsystem flag: {name}"))?;
        self.set(subsystem, level);
        Ok(())
    }

    /// Applies a comma-separated list of flag tokens.
    pub fn apply_flags(&mut self, list: &str) -> Result<(), String> {
        list.split(',')
            .map(str::trim)
            .filter(|token| !token.is_empty())
            .try_for_each(|token| self.apply_flag(token))
    }

    /// Renders the levels as `tracing` filter directives.
    ///
    /// The result starts with `warn` so that warnings from every target stay
    /// visible, followed by one `target=level` directive per enabled subsystem.
    #[must_use]
    pub fn directives(&self) -> String {
        let mut out = String::from("warn");
        for subsystem in Subsystem::ALL {
            let level = match self.get(subsystem) {
                0 => continue,
                1 => "info",
                2 => "debug",
                _ => "trace",
            };
            out.push(',');
            out.push_str(subsystem.target());
            out.push('=');
            out.push_str(level);
        }
        out
    }
}

/// Parse a flag token like "acl2" into ("acl", 2) or "save" into ("save", 1).
fn parse_flag_token(token: &str) -> Result<(&str, u8), String> {
    if token.is_empty() {
        return Err("empty flag token".to_string());
    }

    match token.find(|c: char| c.is_ascii_digit()) {
        Some(0) => Err(format!("missing subsystem name in flag: {token}")),
        Some(pos) => {
            let level = token[pos..]
                .parse::<u8>()
                .map_err(|_| format!("invalid level in flag: {token}"))?;
            Ok((&token[..pos], level))
        }
        None => Ok((token, 1)),
    }
}
