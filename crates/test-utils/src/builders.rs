#![allow(dead_code)]

use std::path::{Path, PathBuf};

use provisioner::config::{AnsibleSection, Config, CopySection, RawConfig, VagrantSection};
use provisioner::exec::CommandSpec;

/// `sh -c <script>`.
pub fn sh(script: &str) -> CommandSpec {
    CommandSpec::new("sh").arg("-c").arg(script)
}

/// Builder for `Config` to simplify test setup.
///
/// Starts from the built-in defaults with copy roots pointing somewhere
/// harmless, so tests never depend on `$HOME`.
pub struct ConfigBuilder {
    raw: RawConfig,
}

impl ConfigBuilder {
    pub fn new() -> Self {
        let mut raw = RawConfig::default();
        raw.copy.src_root = PathBuf::from("/nonexistent/src");
        raw.copy.dest_root = PathBuf::from("/nonexistent/dest");
        Self { raw }
    }

    pub fn hosts(mut self, hosts: &[&str]) -> Self {
        self.raw.vagrant.hosts = hosts.iter().map(|h| h.to_string()).collect();
        self
    }

    pub fn ssh_config(mut self, path: impl Into<PathBuf>) -> Self {
        self.raw.vagrant.ssh_config = path.into();
        self
    }

    pub fn playbooks(mut self, playbooks: &[&str]) -> Self {
        self.raw.ansible.playbooks = playbooks.iter().map(PathBuf::from).collect();
        self
    }

    pub fn ansible_command(mut self, command: &[&str]) -> Self {
        self.raw.ansible.command = command.iter().map(|c| c.to_string()).collect();
        self
    }

    pub fn copy_roots(mut self, src: &Path, dest: &Path) -> Self {
        self.raw.copy.src_root = src.to_path_buf();
        self.raw.copy.dest_root = dest.to_path_buf();
        self
    }

    pub fn copy_paths(mut self, clean: &[&str], paths: &[&str]) -> Self {
        self.raw.copy.clean = clean.iter().map(PathBuf::from).collect();
        self.raw.copy.paths = paths.iter().map(PathBuf::from).collect();
        self
    }

    pub fn build(self) -> Config {
        Config::try_from(self.raw).expect("Failed to build valid config from builder")
    }

    pub fn vagrant(&self) -> &VagrantSection {
        &self.raw.vagrant
    }

    pub fn ansible(&self) -> &AnsibleSection {
        &self.raw.ansible
    }

    pub fn copy(&self) -> &CopySection {
        &self.raw.copy
    }
}

impl Default for ConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}
