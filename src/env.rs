use anyhow::Result;
use log::error;
use std::{
    env,
    path::{Path, PathBuf},
};

pub struct Env {}

impl Env {
    pub const ROOT_ENV_VAR: &'static str = "HELIOS_EVAL_ROOT";
    pub const SYS_NAME: &'static str = "heval";

    /// Resolve the evaluation root. An explicit path wins over the
    /// `HELIOS_EVAL_ROOT` variable, which wins over the current directory.
    pub fn eval_root(explicit: Option<&str>) -> Result<PathBuf> {
        if let Some(path) = explicit {
            return Self::expand_path(path);
        }

        match env::var(Self::ROOT_ENV_VAR) {
            Ok(path) if !path.is_empty() => Self::expand_path(&path),
            _ => env::current_dir().map_err(|e| {
                let reason = format!("error getting current directory (error={e:?})");
                error!("{reason}");
                anyhow::anyhow!(reason)
            }),
        }
    }

    pub fn expand_path(path: &str) -> Result<PathBuf> {
        let expanded = shellexpand::full(path).map_err(|e| {
            let reason = format!("error expanding path (path={path}, error={e})");
            error!("{reason}");
            anyhow::anyhow!(reason)
        })?;

        Ok(PathBuf::from(expanded.as_ref()))
    }

    pub fn data_dir(root: &Path, group: &str) -> PathBuf {
        root.join(group).join("data")
    }

    pub fn plots_dir(root: &Path, group: &str) -> PathBuf {
        root.join(group).join("plots")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_explicit_root_wins() {
        let root = Env::eval_root(Some("/tmp/helios-eval")).unwrap();
        assert_eq!(root, PathBuf::from("/tmp/helios-eval"));
    }

    #[test]
    fn test_group_layout() {
        let root = PathBuf::from("/eval");
        assert_eq!(
            Env::data_dir(&root, "e2e"),
            PathBuf::from("/eval/e2e/data")
        );
        assert_eq!(
            Env::plots_dir(&root, "node-count"),
            PathBuf::from("/eval/node-count/plots")
        );
    }
}
