//! Run-wide configuration and fleet inventory.
//!
//! [`RunContext`] is loaded once at startup from environment variables
//! and shared read-only (`Arc<RunContext>`) with every worker.

use std::collections::HashSet;
use std::time::Duration;

use crate::error::CoreError;
use crate::node::{NodeInfo, NodeType};

/// Default remote working directory.
const DEFAULT_REMOTE_WORK_DIR: &str = "/tmp/yardstick";

/// Default per-target wait budget for one dispatch call.
pub const DEFAULT_DISPATCH_TIMEOUT: Duration = Duration::from_secs(300);

/// Default budget for a single remote command.
pub const DEFAULT_COMMAND_TIMEOUT: Duration = Duration::from_secs(120);

/// Point in the run at which cleanup may happen.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CleanStage {
    BeforeStart,
    AfterFinish,
}

/// A boolean flag per [`CleanStage`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StageFlags {
    pub before_start: bool,
    pub after_finish: bool,
}

impl StageFlags {
    pub fn get(&self, stage: CleanStage) -> bool {
        match stage {
            CleanStage::BeforeStart => self.before_start,
            CleanStage::AfterFinish => self.after_finish,
        }
    }
}

/// Docker-specific settings.
#[derive(Debug, Clone)]
pub struct DockerContext {
    /// Prefix every docker invocation with `sudo`.
    pub use_sudo: bool,
    pub server_image: String,
    pub driver_image: String,
    pub remove_containers: StageFlags,
    pub remove_images: StageFlags,
}

impl DockerContext {
    pub fn image_name(&self, node_type: NodeType) -> &str {
        match node_type {
            NodeType::Server => &self.server_image,
            NodeType::Driver => &self.driver_image,
        }
    }
}

/// Run-wide configuration plus the host inventory.
#[derive(Debug, Clone)]
pub struct RunContext {
    pub server_hosts: Vec<String>,
    pub driver_hosts: Vec<String>,
    pub remote_work_dir: String,
    pub ssh_user: Option<String>,
    pub server_start_cmd: String,
    pub driver_start_cmd: String,
    pub docker: DockerContext,
    /// Per-target wait budget used by the dispatchers.
    pub dispatch_timeout: Duration,
    /// Worker pool size override; `None` means processor count.
    pub pool_size: Option<usize>,
    pub command_timeout: Duration,
}

impl RunContext {
    /// Load configuration from environment variables.
    ///
    /// | Env Var                              | Default                          |
    /// |--------------------------------------|----------------------------------|
    /// | `YARDSTICK_SERVER_HOSTS`             | empty                            |
    /// | `YARDSTICK_DRIVER_HOSTS`             | empty                            |
    /// | `YARDSTICK_REMOTE_WORK_DIR`          | `/tmp/yardstick`                 |
    /// | `YARDSTICK_SSH_USER`                 | none                             |
    /// | `YARDSTICK_DOCKER_SUDO`              | `false`                          |
    /// | `YARDSTICK_SERVER_IMAGE`             | `yardstick-server`               |
    /// | `YARDSTICK_DRIVER_IMAGE`             | `yardstick-driver`               |
    /// | `YARDSTICK_SERVER_START_CMD`         | `bin/benchmark-servers-start.sh` |
    /// | `YARDSTICK_DRIVER_START_CMD`         | `bin/benchmark-drivers-start.sh` |
    /// | `YARDSTICK_REMOVE_CONTAINERS_BEFORE` | `true`                           |
    /// | `YARDSTICK_REMOVE_CONTAINERS_AFTER`  | `false`                          |
    /// | `YARDSTICK_REMOVE_IMAGES_BEFORE`     | `false`                          |
    /// | `YARDSTICK_REMOVE_IMAGES_AFTER`      | `false`                          |
    /// | `YARDSTICK_DISPATCH_TIMEOUT_SECS`    | `300`                            |
    /// | `YARDSTICK_DISPATCH_POOL_SIZE`       | processor count                  |
    /// | `YARDSTICK_COMMAND_TIMEOUT_SECS`     | `120`                            |
    pub fn from_env() -> Result<Self, CoreError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build a context from an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, CoreError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let server_hosts = parse_list(get("YARDSTICK_SERVER_HOSTS"));
        let driver_hosts = parse_list(get("YARDSTICK_DRIVER_HOSTS"));

        if server_hosts.is_empty() && driver_hosts.is_empty() {
            return Err(CoreError::Config {
                var: "YARDSTICK_SERVER_HOSTS",
                reason: "at least one server or driver host is required".to_string(),
            });
        }

        let remote_work_dir = get("YARDSTICK_REMOTE_WORK_DIR")
            .map(|v| v.trim().trim_end_matches('/').to_string())
            .unwrap_or_else(|| DEFAULT_REMOTE_WORK_DIR.to_string());

        let docker = DockerContext {
            use_sudo: parse_bool("YARDSTICK_DOCKER_SUDO", get("YARDSTICK_DOCKER_SUDO"), false)?,
            server_image: get("YARDSTICK_SERVER_IMAGE")
                .unwrap_or_else(|| "yardstick-server".to_string()),
            driver_image: get("YARDSTICK_DRIVER_IMAGE")
                .unwrap_or_else(|| "yardstick-driver".to_string()),
            remove_containers: StageFlags {
                before_start: parse_bool(
                    "YARDSTICK_REMOVE_CONTAINERS_BEFORE",
                    get("YARDSTICK_REMOVE_CONTAINERS_BEFORE"),
                    true,
                )?,
                after_finish: parse_bool(
                    "YARDSTICK_REMOVE_CONTAINERS_AFTER",
                    get("YARDSTICK_REMOVE_CONTAINERS_AFTER"),
                    false,
                )?,
            },
            remove_images: StageFlags {
                before_start: parse_bool(
                    "YARDSTICK_REMOVE_IMAGES_BEFORE",
                    get("YARDSTICK_REMOVE_IMAGES_BEFORE"),
                    false,
                )?,
                after_finish: parse_bool(
                    "YARDSTICK_REMOVE_IMAGES_AFTER",
                    get("YARDSTICK_REMOVE_IMAGES_AFTER"),
                    false,
                )?,
            },
        };

        let dispatch_timeout = match get("YARDSTICK_DISPATCH_TIMEOUT_SECS") {
            Some(v) => Duration::from_secs(parse_u64("YARDSTICK_DISPATCH_TIMEOUT_SECS", &v)?),
            None => DEFAULT_DISPATCH_TIMEOUT,
        };

        let command_timeout = match get("YARDSTICK_COMMAND_TIMEOUT_SECS") {
            Some(v) => Duration::from_secs(parse_u64("YARDSTICK_COMMAND_TIMEOUT_SECS", &v)?),
            None => DEFAULT_COMMAND_TIMEOUT,
        };

        let pool_size = match get("YARDSTICK_DISPATCH_POOL_SIZE") {
            Some(v) => match parse_u64("YARDSTICK_DISPATCH_POOL_SIZE", &v)? {
                0 => {
                    return Err(CoreError::Config {
                        var: "YARDSTICK_DISPATCH_POOL_SIZE",
                        reason: "must be at least 1".to_string(),
                    })
                }
                n => Some(n as usize),
            },
            None => None,
        };

        Ok(Self {
            server_hosts,
            driver_hosts,
            remote_work_dir,
            ssh_user: get("YARDSTICK_SSH_USER"),
            server_start_cmd: get("YARDSTICK_SERVER_START_CMD")
                .unwrap_or_else(|| "bin/benchmark-servers-start.sh".to_string()),
            driver_start_cmd: get("YARDSTICK_DRIVER_START_CMD")
                .unwrap_or_else(|| "bin/benchmark-drivers-start.sh".to_string()),
            docker,
            dispatch_timeout,
            pool_size,
            command_timeout,
        })
    }

    /// Host entries for `node_type`, in configuration order, duplicates kept.
    pub fn hosts(&self, node_type: NodeType) -> &[String] {
        match node_type {
            NodeType::Server => &self.server_hosts,
            NodeType::Driver => &self.driver_hosts,
        }
    }

    /// Distinct hosts for `node_type`, first-seen order.
    pub fn unique_hosts_by_type(&self, node_type: NodeType) -> Vec<String> {
        dedup(self.hosts(node_type).iter())
    }

    /// Distinct hosts across all node types, first-seen order.
    pub fn unique_hosts(&self) -> Vec<String> {
        dedup(self.server_hosts.iter().chain(self.driver_hosts.iter()))
    }

    /// One node per host entry of `node_type`; ids are positional.
    pub fn nodes(&self, node_type: NodeType) -> Vec<NodeInfo> {
        self.hosts(node_type)
            .iter()
            .enumerate()
            .map(|(idx, host)| NodeInfo::new(host.clone(), node_type, idx.to_string()))
            .collect()
    }

    /// Node types that have at least one host configured.
    pub fn enabled_node_types(&self) -> Vec<NodeType> {
        NodeType::ALL
            .into_iter()
            .filter(|t| !self.hosts(*t).is_empty())
            .collect()
    }

    /// `true` when no host runs both servers and drivers.
    pub fn check_if_different_hosts(&self) -> bool {
        let servers: HashSet<&str> = self.server_hosts.iter().map(String::as_str).collect();
        self.driver_hosts
            .iter()
            .all(|h| !servers.contains(h.as_str()))
    }

    pub fn start_cmd(&self, node_type: NodeType) -> &str {
        match node_type {
            NodeType::Server => &self.server_start_cmd,
            NodeType::Driver => &self.driver_start_cmd,
        }
    }
}

fn dedup<'a>(hosts: impl Iterator<Item = &'a String>) -> Vec<String> {
    let mut seen = HashSet::new();
    hosts
        .filter(|h| seen.insert(h.as_str()))
        .cloned()
        .collect()
}

fn parse_list(value: Option<String>) -> Vec<String> {
    value
        .unwrap_or_default()
        .split(',')
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}

fn parse_bool(var: &'static str, value: Option<String>, default: bool) -> Result<bool, CoreError> {
    let Some(value) = value else {
        return Ok(default);
    };
    match value.trim().to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" => Ok(true),
        "false" | "0" | "no" => Ok(false),
        other => Err(CoreError::Config {
            var,
            reason: format!("expected a boolean, got \"{other}\""),
        }),
    }
}

fn parse_u64(var: &'static str, value: &str) -> Result<u64, CoreError> {
    value.trim().parse().map_err(|_| CoreError::Config {
        var,
        reason: format!("expected a non-negative integer, got \"{}\"", value.trim()),
    })
}
