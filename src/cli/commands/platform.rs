//! Platform report.
//!
//! The `toolup platform` command prints the platform release assets are
//! matched against, along with the name fragments each part is known by.

use crate::cli::args::PlatformArgs;
use crate::error::Result;
use crate::platform::{Arch, Os, Platform};
use crate::ui::UserInterface;

use super::dispatcher::{Command, CommandResult};

/// The platform command implementation.
pub struct PlatformCommand {
    args: PlatformArgs,
}

impl PlatformCommand {
    /// Create a new platform command.
    pub fn new(args: PlatformArgs) -> Self {
        Self { args }
    }

    /// The platform being reported, after overrides.
    pub fn platform(&self) -> Platform {
        Platform::new(
            self.args.os.unwrap_or_else(Os::current),
            self.args.arch.unwrap_or_else(Arch::current),
        )
    }

    /// Report lines, in display order.
    pub fn report(platform: &Platform) -> Vec<String> {
        let extension = match platform.os.exe_extension() {
            "" => "(none)",
            ext => ext,
        };
        vec![
            format!("Platform: {}", platform),
            format!("  OS: {} ({})", platform.os, platform.os.aliases().join(", ")),
            format!(
                "  Arch: {} ({})",
                platform.arch,
                platform.arch.aliases().join(", ")
            ),
            format!("  Library: {}", platform.library.alias().unwrap_or("none")),
            format!("  Executable extension: {}", extension),
        ]
    }
}

impl Command for PlatformCommand {
    fn execute(&self, ui: &mut dyn UserInterface) -> Result<CommandResult> {
        for line in Self::report(&self.platform()) {
            ui.message(&line);
        }
        Ok(CommandResult::success())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ui::MockUI;

    #[test]
    fn reports_current_platform_by_default() {
        let cmd = PlatformCommand::new(PlatformArgs::default());
        assert_eq!(cmd.platform(), Platform::current());

        let mut ui = MockUI::new();
        assert!(cmd.execute(&mut ui).unwrap().success);
        assert!(ui.has_message(&format!("Platform: {}", Platform::current())));
    }

    #[test]
    fn windows_report_names_extension_and_library() {
        let cmd = PlatformCommand::new(PlatformArgs {
            os: Some(Os::Windows),
            arch: Some(Arch::Arm64),
        });
        let mut ui = MockUI::new();
        cmd.execute(&mut ui).unwrap();

        assert!(ui.has_message("Platform: windows/arm64"));
        assert!(ui.has_message("  Library: msvc"));
        assert!(ui.has_message("  Executable extension: .exe"));
    }

    #[test]
    fn macos_has_no_extension_or_library() {
        let lines = PlatformCommand::report(&Platform::new(Os::MacOS, Arch::Amd64));
        assert_eq!(lines[3], "  Library: none");
        assert_eq!(lines[4], "  Executable extension: (none)");
    }
}
