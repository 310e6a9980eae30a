use std::path::{Path, PathBuf};

use serde_yaml::{Mapping, Value};

/// Command that keeps a debug container alive until a shell detaches it.
pub const DEBUG_COMMAND: &[&str] = &[
    "/bin/bash",
    "-c",
    "trap 'exit 0' TERM INT; sleep infinity & wait",
];

/// Label added to patched manifests for later discovery
/// (`kubectl get pods -l debug=true`).
pub const DEBUG_LABEL: &str = "debug";

/// Pick the manifest to patch for an interactive deploy.
///
/// A single template is always the target, whatever `requested` says;
/// with several templates the target is the one whose file name (or
/// template-relative path) matches `requested` exactly. `None` means no
/// template qualifies and the caller must refuse the deploy.
pub fn select_debug_target<'a>(
    files: &'a [PathBuf],
    requested: Option<&str>,
) -> Option<&'a PathBuf> {
    if let [only] = files {
        return Some(only);
    }
    let requested = requested?;
    files.iter().find(|f| {
        f.as_path() == Path::new(requested)
            || f.file_name().is_some_and(|name| name == requested)
    })
}

/// Rewrite a rendered manifest so its pods idle for shell attach.
///
/// Every `containers[].command` in every YAML document becomes an
/// indefinite sleep (container `args` are dropped with the old command),
/// and each document gets a `debug=true` metadata label.
pub fn patch_for_debug(yaml: &str) -> Result<String, PatchError> {
    let mut docs = Vec::new();
    for doc in serde_yaml::Deserializer::from_str(yaml) {
        let value: Value =
            serde::Deserialize::deserialize(doc).map_err(|e| PatchError::Parse { source: e })?;
        docs.push(value);
    }

    let mut patched_containers = 0;
    for doc in &mut docs {
        patched_containers += patch_containers(doc);
        if let Value::Mapping(mapping) = doc {
            label_debug(mapping);
        }
    }

    if patched_containers == 0 {
        return Err(PatchError::NoContainers);
    }

    let mut out = String::new();
    for (i, doc) in docs.iter().enumerate() {
        if i > 0 {
            out.push_str("---\n");
        }
        let rendered =
            serde_yaml::to_string(doc).map_err(|e| PatchError::Serialize { source: e })?;
        out.push_str(&rendered);
    }
    Ok(out)
}

/// Walk the document and rewrite every container list found under a
/// `containers` key. Returns how many containers were rewritten.
fn patch_containers(value: &mut Value) -> usize {
    let mut patched = 0;
    match value {
        Value::Mapping(mapping) => {
            for (key, nested) in mapping.iter_mut() {
                if key.as_str() == Some("containers") {
                    if let Value::Sequence(containers) = nested {
                        for container in containers.iter_mut() {
                            if let Value::Mapping(container) = container {
                                container.insert(
                                    Value::from("command"),
                                    Value::Sequence(
                                        DEBUG_COMMAND.iter().map(|s| Value::from(*s)).collect(),
                                    ),
                                );
                                container.remove("args");
                                patched += 1;
                            }
                        }
                    }
                } else {
                    patched += patch_containers(nested);
                }
            }
        }
        Value::Sequence(seq) => {
            for nested in seq.iter_mut() {
                patched += patch_containers(nested);
            }
        }
        _ => {}
    }
    patched
}

fn label_debug(doc: &mut Mapping) {
    let metadata = doc
        .entry(Value::from("metadata"))
        .or_insert_with(|| Value::Mapping(Mapping::new()));
    if let Value::Mapping(metadata) = metadata {
        let labels = metadata
            .entry(Value::from("labels"))
            .or_insert_with(|| Value::Mapping(Mapping::new()));
        if let Value::Mapping(labels) = labels {
            labels.insert(Value::from(DEBUG_LABEL), Value::from("true"));
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum PatchError {
    #[error("manifest is not valid YAML")]
    Parse { source: serde_yaml::Error },

    #[error("failed to serialize patched manifest")]
    Serialize { source: serde_yaml::Error },

    #[error("manifest has no containers to patch for interactive debugging")]
    NoContainers,
}
