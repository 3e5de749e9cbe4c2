mod config;
mod env;
mod kubeconfig;

pub use config::KubeletConfiguration;
pub use env::{extra_kubelet_config, kubelet_env_params, metadata_env_params, UBUNTU_2004_RESOLV_CONF};
pub use kubeconfig::{Authenticator, KubeConfig};
