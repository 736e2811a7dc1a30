// src/config/model.rs

use std::path::PathBuf;
use std::time::Duration;

use serde::Deserialize;

use crate::types::HumanDuration;

/// Configuration as read from a TOML file, before validation.
///
/// Every section is optional; the defaults reproduce the cluster layout
/// this tool was written for:
///
/// ```toml
/// [runner]
/// grace_period = "20s"
///
/// [vagrant]
/// hosts = ["vm-dns", "vm01", "vm02", "vm03", "vm04"]
/// ssh_config = "inventory/vagrant.ssh_config"
///
/// [ansible]
/// command = ["rye", "run", "ansible-playbook"]
/// inventory = "inventory/vagrant.py"
/// playbooks = ["playbooks/dns-server.yml"]
///
/// [copy]
/// src_root = "~/workdir/github.com/pollenjp/infra/ansible"
/// dest_root = "~/workdir/github.com/pollenjp/sample-vagrant-libvirt-ansible-kubernetes"
/// clean = ["playbooks", "tools/cmd"]
/// paths = ["ansible.cfg", "playbooks/roles/utils"]
/// ```
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RawConfig {
    #[serde(default)]
    pub runner: RunnerSection,

    #[serde(default)]
    pub vagrant: VagrantSection,

    #[serde(default)]
    pub ansible: AnsibleSection,

    #[serde(default)]
    pub copy: CopySection,
}

/// `[runner]` section.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RunnerSection {
    /// Time a command gets to exit after a forwarded signal before its
    /// process group is killed.
    #[serde(default = "default_grace_period")]
    pub grace_period: HumanDuration,
}

fn default_grace_period() -> HumanDuration {
    HumanDuration(Duration::from_secs(20))
}

impl Default for RunnerSection {
    fn default() -> Self {
        Self {
            grace_period: default_grace_period(),
        }
    }
}

/// `[vagrant]` section.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct VagrantSection {
    /// Machines brought up one at a time, in this order.
    #[serde(default = "default_hosts")]
    pub hosts: Vec<String>,

    /// Where `vagrant ssh-config` output is written.
    #[serde(default = "default_ssh_config")]
    pub ssh_config: PathBuf,
}

fn default_hosts() -> Vec<String> {
    ["vm-dns", "vm01", "vm02", "vm03", "vm04"]
        .into_iter()
        .map(String::from)
        .collect()
}

fn default_ssh_config() -> PathBuf {
    PathBuf::from("inventory/vagrant.ssh_config")
}

impl Default for VagrantSection {
    fn default() -> Self {
        Self {
            hosts: default_hosts(),
            ssh_config: default_ssh_config(),
        }
    }
}

/// `[ansible]` section.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AnsibleSection {
    /// Program and leading arguments used to invoke `ansible-playbook`.
    #[serde(default = "default_ansible_command")]
    pub command: Vec<String>,

    #[serde(default = "default_inventory")]
    pub inventory: PathBuf,

    /// Applied in order; each becomes one pipeline stage.
    #[serde(default = "default_playbooks")]
    pub playbooks: Vec<PathBuf>,
}

fn default_ansible_command() -> Vec<String> {
    ["rye", "run", "ansible-playbook"]
        .into_iter()
        .map(String::from)
        .collect()
}

fn default_inventory() -> PathBuf {
    PathBuf::from("inventory/vagrant.py")
}

fn default_playbooks() -> Vec<PathBuf> {
    [
        "playbooks/dns-server.yml",
        "playbooks/k8s-setup-control-plane.yml",
        "playbooks/k8s-setup-join-node.yml",
    ]
    .into_iter()
    .map(PathBuf::from)
    .collect()
}

impl Default for AnsibleSection {
    fn default() -> Self {
        Self {
            command: default_ansible_command(),
            inventory: default_inventory(),
            playbooks: default_playbooks(),
        }
    }
}

/// `[copy]` section.
///
/// `src_root` / `dest_root` may start with `~/`, which is expanded against
/// `$HOME` during validation.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CopySection {
    #[serde(default = "default_src_root")]
    pub src_root: PathBuf,

    #[serde(default = "default_dest_root")]
    pub dest_root: PathBuf,

    /// Paths under `dest_root` removed before copying.
    #[serde(default = "default_clean")]
    pub clean: Vec<PathBuf>,

    /// Paths relative to both roots, synced one at a time.
    #[serde(default = "default_copy_paths")]
    pub paths: Vec<PathBuf>,
}

fn default_src_root() -> PathBuf {
    PathBuf::from("~/workdir/github.com/pollenjp/infra/ansible")
}

fn default_dest_root() -> PathBuf {
    PathBuf::from("~/workdir/github.com/pollenjp/sample-vagrant-libvirt-ansible-kubernetes")
}

fn default_clean() -> Vec<PathBuf> {
    ["playbooks", "tools/cmd"].into_iter().map(PathBuf::from).collect()
}

fn default_copy_paths() -> Vec<PathBuf> {
    [
        ".gitignore",
        ".yamllint",
        "ansible.cfg",
        "Gemfile",
        "Gemfile.lock",
        "Makefile",
        "pyproject.toml",
        "Vagrantfile",
        "ansible-galaxy-requirements.yml",
        "inventory/.gitignore",
        "inventory/vagrant.py",
        "playbooks/.gitignore",
        "playbooks/dns_server.yml",
        "playbooks/k8s-setup-control-plane.yml",
        "playbooks/k8s-setup-join-node.yml",
        "playbooks/config/kube-flannel.yml",
        "playbooks/files/playbooks/dns_server",
        "playbooks/group_vars/k8s_all",
        "playbooks/roles/dns_server",
        "playbooks/roles/install_bind",
        "playbooks/roles/install_docker",
        "playbooks/roles/install_kubernetes",
        "playbooks/roles/k8s_cp_kubeadm_init",
        "playbooks/roles/k8s_cp_load_balancer",
        "playbooks/roles/k8s_requirements",
        "playbooks/roles/utils",
        "tools/cmd",
    ]
    .into_iter()
    .map(PathBuf::from)
    .collect()
}

impl Default for CopySection {
    fn default() -> Self {
        Self {
            src_root: default_src_root(),
            dest_root: default_dest_root(),
            clean: default_clean(),
            paths: default_copy_paths(),
        }
    }
}

/// Validated configuration used by the workflows.
///
/// Only constructed through `TryFrom<RawConfig>` (see `validate.rs`), so
/// the grace period is known-good and copy roots are expanded.
#[derive(Debug, Clone)]
pub struct Config {
    pub grace_period: Duration,
    pub vagrant: VagrantSection,
    pub ansible: AnsibleSection,
    pub copy: CopySection,
}

impl Config {
    pub(crate) fn new_unchecked(
        grace_period: Duration,
        vagrant: VagrantSection,
        ansible: AnsibleSection,
        copy: CopySection,
    ) -> Self {
        Self {
            grace_period,
            vagrant,
            ansible,
            copy,
        }
    }
}
