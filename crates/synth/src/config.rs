//! Text artifacts shipped to every member through the cluster ConfigMap.
//!
//! Output is byte-stable: keys are always emitted, always in the same order.

use std::collections::BTreeMap;

use k8s_openapi::api::core::v1::ConfigMap;
use zkop_core::{names, PortRoleMap, ZookeeperCluster, ZookeeperConfig};

pub const ZOO_CFG_KEY: &str = "zoo.cfg";
pub const LOG4J_KEY: &str = "log4j.properties";
pub const LOG4J_QUIET_KEY: &str = "log4j-quiet.properties";
pub const ENV_KEY: &str = "env.sh";

const LOG_PATTERN: &str = "%d{ISO8601} [myid:%X{myid}] - %-5p [%t:%C{1}@%L] - %m%n";

/// The four files, by ConfigMap key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigArtifacts {
    pub zoo_cfg: String,
    pub log4j: String,
    pub log4j_quiet: String,
    pub env_sh: String,
}

impl ConfigArtifacts {
    pub fn render(ports: &PortRoleMap, conf: &ZookeeperConfig, headless_domain: &str) -> Self {
        Self {
            zoo_cfg: zoo_cfg(conf),
            log4j: log4j(),
            log4j_quiet: log4j_quiet(),
            env_sh: env_sh(ports, headless_domain),
        }
    }

    pub fn into_data(self) -> BTreeMap<String, String> {
        BTreeMap::from([
            (ZOO_CFG_KEY.to_string(), self.zoo_cfg),
            (LOG4J_KEY.to_string(), self.log4j),
            (LOG4J_QUIET_KEY.to_string(), self.log4j_quiet),
            (ENV_KEY.to_string(), self.env_sh),
        ])
    }
}

pub fn zoo_cfg(conf: &ZookeeperConfig) -> String {
    format!(
        "4lw.commands.whitelist=cons, envi, conf, crst, srvr, stat, mntr, ruok\n\
         dataDir=/data\n\
         standaloneEnabled=false\n\
         reconfigEnabled=true\n\
         skipACL=yes\n\
         initLimit={}\n\
         syncLimit={}\n\
         tickTime={}\n\
         dynamicConfigFile=/data/zoo.cfg.dynamic\n",
        conf.init_limit, conf.sync_limit, conf.tick_time
    )
}

pub fn log4j() -> String {
    format!(
        "zookeeper.root.logger=CONSOLE\n\
         zookeeper.console.threshold=INFO\n\
         log4j.rootLogger=${{zookeeper.root.logger}}\n\
         log4j.appender.CONSOLE=org.apache.log4j.ConsoleAppender\n\
         log4j.appender.CONSOLE.Threshold=${{zookeeper.console.threshold}}\n\
         log4j.appender.CONSOLE.layout=org.apache.log4j.PatternLayout\n\
         log4j.appender.CONSOLE.layout.ConversionPattern={LOG_PATTERN}\n"
    )
}

pub fn log4j_quiet() -> String {
    format!(
        "log4j.rootLogger=ERROR, CONSOLE\n\
         log4j.appender.CONSOLE=org.apache.log4j.ConsoleAppender\n\
         log4j.appender.CONSOLE.Threshold=ERROR\n\
         log4j.appender.CONSOLE.layout=org.apache.log4j.PatternLayout\n\
         log4j.appender.CONSOLE.layout.ConversionPattern={LOG_PATTERN}\n"
    )
}

pub fn env_sh(ports: &PortRoleMap, headless_domain: &str) -> String {
    format!(
        "#!/usr/bin/env bash\n\n\
         DOMAIN={}\n\
         QUORUM_PORT={}\n\
         LEADER_PORT={}\n\
         CLIENT_PORT={}\n",
        headless_domain,
        ports.quorum(),
        ports.leader(),
        ports.client()
    )
}

pub fn config_map(zk: &ZookeeperCluster, name: String, ports: &PortRoleMap) -> ConfigMap {
    let artifacts = ConfigArtifacts::render(ports, &zk.spec.conf, &names::headless_domain(zk));
    ConfigMap {
        metadata: names::owned_meta(zk, name),
        data: Some(artifacts.into_data()),
        ..ConfigMap::default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use k8s_openapi::api::core::v1::ContainerPort;

    fn ports() -> PortRoleMap {
        let p = |n: &str, v: i32| ContainerPort { name: Some(n.into()), container_port: v, ..ContainerPort::default() };
        PortRoleMap::resolve(&[p("client", 2181), p("quorum", 2888), p("leader-election", 3888)])
    }

    #[test]
    fn env_script_is_exact() {
        let s = env_sh(&ports(), "zk-headless.ns.svc.cluster.local");
        assert_eq!(
            s,
            "#!/usr/bin/env bash\n\nDOMAIN=zk-headless.ns.svc.cluster.local\nQUORUM_PORT=2888\nLEADER_PORT=3888\nCLIENT_PORT=2181\n"
        );
    }

    #[test]
    fn env_script_renders_unset_roles_as_zero() {
        let s = env_sh(&PortRoleMap::default(), "d");
        assert!(s.ends_with("QUORUM_PORT=0\nLEADER_PORT=0\nCLIENT_PORT=0\n"));
    }

    #[test]
    fn zoo_cfg_keys_are_ordered() {
        let conf = ZookeeperConfig { init_limit: 5, tick_time: 1000, sync_limit: 3 };
        let cfg = zoo_cfg(&conf);
        let keys: Vec<&str> = cfg.lines().map(|l| l.split('=').next().unwrap()).collect();
        assert_eq!(
            keys,
            vec![
                "4lw.commands.whitelist", "dataDir", "standaloneEnabled", "reconfigEnabled", "skipACL",
                "initLimit", "syncLimit", "tickTime", "dynamicConfigFile",
            ]
        );
        assert!(cfg.contains("\ninitLimit=5\nsyncLimit=3\ntickTime=1000\n"));
        assert!(cfg.starts_with("4lw.commands.whitelist=cons, envi, conf, crst, srvr, stat, mntr, ruok\n"));
    }

    #[test]
    fn logging_configs_differ_only_in_threshold() {
        let verbose = log4j();
        let quiet = log4j_quiet();
        assert!(verbose.contains("zookeeper.console.threshold=INFO\n"));
        assert!(verbose.contains("log4j.rootLogger=${zookeeper.root.logger}\n"));
        assert!(quiet.starts_with("log4j.rootLogger=ERROR, CONSOLE\n"));
        let pattern = format!("ConversionPattern={LOG_PATTERN}\n");
        assert!(verbose.ends_with(&pattern));
        assert!(quiet.ends_with(&pattern));
    }

    #[test]
    fn data_has_four_keys() {
        let data = ConfigArtifacts::render(&ports(), &ZookeeperConfig::default(), "d").into_data();
        let keys: Vec<&str> = data.keys().map(String::as_str).collect();
        assert_eq!(keys, vec![ENV_KEY, LOG4J_QUIET_KEY, LOG4J_KEY, ZOO_CFG_KEY]);
    }
}
