//! Reading a `ZookeeperCluster` document from YAML.

#![forbid(unsafe_code)]

use anyhow::{anyhow, Context, Result};
use kube::Resource;
use serde_json::Value as Json;
use zkop_core::ZookeeperCluster;

fn max_yaml_bytes() -> usize {
    std::env::var("ZKOP_MAX_YAML_BYTES")
        .ok()
        .and_then(|s| s.parse::<usize>().ok())
        .unwrap_or(1_000_000) // 1 MiB default
}

fn str_at<'a>(v: &'a Json, path: &[&str]) -> Option<&'a str> {
    path.iter().try_fold(v, |cur, key| cur.get(key))?.as_str()
}

/// Parse one cluster document. Namespace resolution: `ns_override`, then
/// `metadata.namespace`, then `default`.
pub fn parse_cluster_yaml(yaml: &str, ns_override: Option<&str>) -> Result<ZookeeperCluster> {
    let max = max_yaml_bytes();
    if yaml.len() > max {
        return Err(anyhow!("YAML payload too large (>{} bytes)", max));
    }
    let val: serde_yaml::Value = serde_yaml::from_str(yaml).context("parsing YAML")?;
    let mut json = serde_json::to_value(val).context("converting YAML to JSON")?;

    let api_version = str_at(&json, &["apiVersion"]).ok_or_else(|| anyhow!("YAML missing apiVersion"))?;
    let kind = str_at(&json, &["kind"]).ok_or_else(|| anyhow!("YAML missing kind"))?;
    if kind != ZookeeperCluster::kind(&()) {
        return Err(anyhow!("unexpected kind {} (expect {})", kind, ZookeeperCluster::kind(&())));
    }
    if api_version != ZookeeperCluster::api_version(&()) {
        return Err(anyhow!("unexpected apiVersion {} (expect {})", api_version, ZookeeperCluster::api_version(&())));
    }
    str_at(&json, &["metadata", "name"]).ok_or_else(|| anyhow!("YAML missing metadata.name"))?;
    // every spec field has a default, so an absent or null spec means "all defaults"
    if let Some(obj) = json.as_object_mut() {
        if obj.get("spec").map_or(true, Json::is_null) {
            obj.insert("spec".to_string(), Json::Object(Default::default()));
        }
    }

    let mut zk: ZookeeperCluster = serde_json::from_value(json).context("decoding ZookeeperCluster")?;
    let ns = ns_override
        .map(str::to_string)
        .or_else(|| zk.metadata.namespace.take())
        .unwrap_or_else(|| "default".to_string());
    zk.metadata.namespace = Some(ns);
    Ok(zk)
}

#[cfg(test)]
mod tests {
    use super::*;

    const DOC: &str = "apiVersion: zookeeper.pravega.io/v1beta1\nkind: ZookeeperCluster\nmetadata:\n  name: zk\n  namespace: infra\nspec:\n  size: 5\n";

    #[test]
    fn parses_cluster_and_fills_defaults() {
        let zk = parse_cluster_yaml(DOC, None).unwrap();
        assert_eq!(zk.metadata.name.as_deref(), Some("zk"));
        assert_eq!(zk.metadata.namespace.as_deref(), Some("infra"));
        assert_eq!(zk.spec.size, 5);
        assert_eq!(zk.spec.ports.len(), 3);
    }

    #[test]
    fn namespace_override_then_default() {
        assert_eq!(parse_cluster_yaml(DOC, Some("other")).unwrap().metadata.namespace.as_deref(), Some("other"));
        let no_ns = "apiVersion: zookeeper.pravega.io/v1beta1\nkind: ZookeeperCluster\nmetadata:\n  name: zk\n";
        assert_eq!(parse_cluster_yaml(no_ns, None).unwrap().metadata.namespace.as_deref(), Some("default"));
    }

    #[test]
    fn missing_or_empty_spec_takes_defaults() {
        let bare = "apiVersion: zookeeper.pravega.io/v1beta1\nkind: ZookeeperCluster\nmetadata:\n  name: zk\n";
        let zk = parse_cluster_yaml(bare, None).unwrap();
        assert_eq!(zk.spec.size, 3);
        assert_eq!(zk.spec.image.reference(), "emccorp/zookeeper:3.5.4-beta-operator");
        assert_eq!(zk.spec.ports.len(), 3);

        let null_spec = format!("{}spec:\n", bare);
        assert_eq!(parse_cluster_yaml(&null_spec, None).unwrap().spec.size, 3);
    }

    #[test]
    fn parse_yaml_errors_are_friendly() {
        let e1 = parse_cluster_yaml("kind: ZookeeperCluster\nmetadata:\n  name: x\n", None).unwrap_err().to_string();
        assert!(e1.contains("missing apiVersion"), "e1={}", e1);

        let e2 = parse_cluster_yaml("apiVersion: v1\nmetadata:\n  name: x\n", None).unwrap_err().to_string();
        assert!(e2.contains("missing kind"), "e2={}", e2);

        let e3 = parse_cluster_yaml("apiVersion: zookeeper.pravega.io/v1beta1\nkind: ZookeeperCluster\nmetadata: {}\n", None)
            .unwrap_err()
            .to_string();
        assert!(e3.contains("missing metadata.name"), "e3={}", e3);

        let e4 = parse_cluster_yaml("apiVersion: v1\nkind: ConfigMap\nmetadata:\n  name: x\n", None).unwrap_err().to_string();
        assert!(e4.contains("unexpected kind ConfigMap"), "e4={}", e4);
    }
}
