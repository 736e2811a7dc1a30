// src/workflow/ansible.rs

//! Configuration-management stages.

use std::path::{self, Path};

use crate::config::AnsibleSection;
use crate::errors::{ProvisionError, Result};
use crate::exec::{CommandRunner, CommandSpec};
use crate::pipeline::Pipeline;

/// Environment variable through which ansible picks up the ssh config.
pub const SSH_ARGS_ENV: &str = "ANSIBLE_SSH_ARGS";

/// One `ansible-playbook -i <inventory> <playbook>` per playbook, in order.
///
/// Playbook paths are made absolute against the current directory; the
/// ssh config is passed through [`SSH_ARGS_ENV`] on top of the inherited
/// environment.
pub fn playbook_stages(ansible: &AnsibleSection, ssh_config: &Path) -> Result<Vec<CommandSpec>> {
    let (program, leading) = ansible.command.split_first().ok_or_else(|| {
        ProvisionError::ConfigError("[ansible].command must name a program".to_string())
    })?;

    let ssh_args = format!("-F {}", ssh_config.display());

    ansible
        .playbooks
        .iter()
        .map(|playbook| -> Result<CommandSpec> {
            let playbook = path::absolute(playbook)?;
            Ok(CommandSpec::new(program.as_str())
                .args(leading.iter().map(String::as_str))
                .arg("-i")
                .arg(ansible.inventory.display().to_string())
                .arg(playbook.display().to_string())
                .env(SSH_ARGS_ENV, ssh_args.as_str()))
        })
        .collect()
}

pub async fn run_playbooks<R>(runner: &R, ansible: &AnsibleSection, ssh_config: &Path) -> Result<()>
where
    R: CommandRunner + ?Sized,
{
    Pipeline::new("ansible-playbook", playbook_stages(ansible, ssh_config)?)
        .run(runner)
        .await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn stages_carry_inventory_absolute_playbook_and_ssh_env() {
        let ansible = AnsibleSection {
            command: vec!["rye".into(), "run".into(), "ansible-playbook".into()],
            inventory: PathBuf::from("inventory/vagrant.py"),
            playbooks: vec![PathBuf::from("playbooks/a.yml"), PathBuf::from("/abs/b.yml")],
        };

        let stages = playbook_stages(&ansible, Path::new("inventory/vagrant.ssh_config")).unwrap();
        assert_eq!(stages.len(), 2);

        let first = &stages[0];
        assert_eq!(first.program(), "rye");
        let args = first.get_args();
        assert_eq!(&args[..4], &["run", "ansible-playbook", "-i", "inventory/vagrant.py"]);
        assert!(Path::new(&args[4]).is_absolute());
        assert!(args[4].ends_with("playbooks/a.yml"));
        assert_eq!(
            first.get_env(),
            &[(
                SSH_ARGS_ENV.to_string(),
                "-F inventory/vagrant.ssh_config".to_string()
            )]
        );

        assert_eq!(stages[1].get_args()[4], "/abs/b.yml");
    }
}
