use std::sync::Arc;

use anyhow::{bail, Context};
use arbor_hierarchy::{
    open_group, Array, ArrayOptions, Attributes, DType, Group, Node, OpenMode,
};
use arbor_store::DirectoryStore;
use arbor_sync::{Synchronizer, ThreadSynchronizer};
use colored::Colorize;
use serde::Serialize;
use serde_json::{json, Value};
use tracing::debug;

use crate::cli::*;
use crate::config::CliConfig;

pub fn run_command(cli: Cli) -> anyhow::Result<()> {
    let cwd = std::env::current_dir().context("reading working directory")?;
    let config = CliConfig::resolve(cli.config.as_deref(), &cwd)?.with_store(cli.store);
    debug!(store = %config.store.display(), read_only = config.read_only, "resolved config");
    let fmt = cli.format;
    match cli.command {
        Command::Init(args) => cmd_init(&config, args, fmt),
        Command::Tree(args) => cmd_tree(&config, args, fmt),
        Command::Ls(args) => cmd_ls(&config, args, fmt),
        Command::Info(args) => cmd_info(&config, args, fmt),
        Command::Mkgroup(args) => cmd_mkgroup(&config, args, fmt),
        Command::Mkarray(args) => cmd_mkarray(&config, args, fmt),
        Command::Rm(args) => cmd_rm(&config, args, fmt),
        Command::Attrs(args) => cmd_attrs(&config, args, fmt),
    }
}

/// Open the store root. `r` and `r+` never create the store directory.
fn open_root(config: &CliConfig, mode: OpenMode) -> anyhow::Result<Group> {
    if matches!(mode, OpenMode::Read | OpenMode::ReadWrite) && !config.store.is_dir() {
        bail!("no store at {}", config.store.display());
    }
    let store = DirectoryStore::open(&config.store)
        .with_context(|| format!("opening store {}", config.store.display()))?;
    let synchronizer = config
        .synchronize
        .then(|| Arc::new(ThreadSynchronizer::new()) as Arc<dyn Synchronizer>);
    Ok(open_group(Arc::new(store), mode, synchronizer, "")?)
}

fn open_for_write(config: &CliConfig) -> anyhow::Result<Group> {
    let mode = if config.read_only { OpenMode::Read } else { OpenMode::ReadWrite };
    open_root(config, mode)
}

fn resolve_group(root: Group, path: Option<&str>) -> anyhow::Result<Group> {
    match path {
        None => Ok(root),
        Some(path) => Ok(root.get(path)?.into_group()?),
    }
}

/// JSON if it parses, otherwise the raw text as a string.
fn parse_value(raw: &str) -> Value {
    serde_json::from_str(raw).unwrap_or_else(|_| Value::String(raw.to_string()))
}

fn node_attrs(node: &Node) -> &Attributes {
    match node {
        Node::Array(a) => a.attrs(),
        Node::Group(g) => g.attrs(),
    }
}

fn print_json<T: Serialize>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn array_json(array: &Array) -> Value {
    json!({
        "name": array.name(),
        "shape": array.shape(),
        "chunks": array.chunks(),
        "dtype": array.dtype().type_str(),
        "fill_value": array.fill_value(),
    })
}

fn cmd_init(config: &CliConfig, args: InitArgs, fmt: OutputFormat) -> anyhow::Result<()> {
    let mode = if args.overwrite { OpenMode::Write } else { OpenMode::Create };
    let root = open_root(config, mode)?;
    match fmt {
        OutputFormat::Json => print_json(&json!({ "store": config.store, "group": root.name() })),
        OutputFormat::Text => {
            println!(
                "{} Initialized group {} in {}",
                "✓".green().bold(),
                root.name().cyan(),
                config.store.display().to_string().bold()
            );
            Ok(())
        }
    }
}

fn cmd_tree(config: &CliConfig, args: PathArgs, fmt: OutputFormat) -> anyhow::Result<()> {
    let group = resolve_group(open_root(config, OpenMode::Read)?, args.path.as_deref())?;
    let tree = group.tree()?;
    match fmt {
        OutputFormat::Json => print_json(tree.root()),
        OutputFormat::Text => {
            print!("{tree}");
            Ok(())
        }
    }
}

#[derive(Serialize)]
struct Entry {
    name: String,
    kind: &'static str,
}

fn list_entries(group: &Group, args: &LsArgs) -> anyhow::Result<Vec<Entry>> {
    let mut entries = Vec::new();
    if !args.arrays {
        for name in group.group_keys()? {
            entries.push(Entry { name: name?, kind: "group" });
        }
    }
    if !args.groups {
        for name in group.array_keys()? {
            entries.push(Entry { name: name?, kind: "array" });
        }
    }
    entries.sort_by(|a, b| a.name.cmp(&b.name));
    Ok(entries)
}

fn cmd_ls(config: &CliConfig, args: LsArgs, fmt: OutputFormat) -> anyhow::Result<()> {
    let group = resolve_group(open_root(config, OpenMode::Read)?, args.path.as_deref())?;
    let entries = list_entries(&group, &args)?;
    match fmt {
        OutputFormat::Json => print_json(&entries),
        OutputFormat::Text => {
            for entry in &entries {
                if entry.kind == "group" {
                    println!("{}/", entry.name.blue().bold());
                } else {
                    println!("{}", entry.name);
                }
            }
            Ok(())
        }
    }
}

fn cmd_info(config: &CliConfig, args: PathArgs, fmt: OutputFormat) -> anyhow::Result<()> {
    let group = resolve_group(open_root(config, OpenMode::Read)?, args.path.as_deref())?;
    let info = group.info()?;
    match fmt {
        OutputFormat::Json => {
            let rows: serde_json::Map<String, Value> = info
                .rows
                .iter()
                .map(|(label, value)| (label.clone(), Value::String(value.clone())))
                .collect();
            print_json(&rows)
        }
        OutputFormat::Text => {
            print!("{info}");
            Ok(())
        }
    }
}

fn cmd_mkgroup(config: &CliConfig, args: MkgroupArgs, fmt: OutputFormat) -> anyhow::Result<()> {
    let root = open_for_write(config)?;
    let group = if args.require {
        root.require_group(&args.name, false)?
    } else {
        root.create_group(&args.name, false)?
    };
    match fmt {
        OutputFormat::Json => print_json(&json!({ "name": group.name() })),
        OutputFormat::Text => {
            println!("{} Created group {}", "✓".green().bold(), group.name().cyan());
            Ok(())
        }
    }
}

fn cmd_mkarray(config: &CliConfig, args: MkarrayArgs, fmt: OutputFormat) -> anyhow::Result<()> {
    let dtype: DType = args.dtype.parse()?;
    let options = ArrayOptions {
        chunks: args.chunks,
        fill_value: args.fill.as_deref().map(parse_value),
        overwrite: args.overwrite,
    };
    let root = open_for_write(config)?;
    let array = root.create(&args.name, args.shape, dtype, &options)?;
    match fmt {
        OutputFormat::Json => print_json(&array_json(&array)),
        OutputFormat::Text => {
            println!("{} Created array {}", "✓".green().bold(), array.to_string().cyan());
            println!("  Chunks: {:?}", array.chunks());
            println!("  Fill: {}", array.fill_value());
            Ok(())
        }
    }
}

fn cmd_rm(config: &CliConfig, args: RmArgs, fmt: OutputFormat) -> anyhow::Result<()> {
    let root = open_for_write(config)?;
    root.delete(&args.name)?;
    match fmt {
        OutputFormat::Json => print_json(&json!({ "deleted": args.name })),
        OutputFormat::Text => {
            println!("{} Removed {}", "✓".green().bold(), args.name.yellow());
            Ok(())
        }
    }
}

fn cmd_attrs(config: &CliConfig, args: AttrsArgs, fmt: OutputFormat) -> anyhow::Result<()> {
    let root = if args.value.is_some() {
        open_for_write(config)?
    } else {
        open_root(config, OpenMode::Read)?
    };
    let node = root.get(&args.path)?;
    let attrs = node_attrs(&node);
    let shown = match (args.key, args.value) {
        (Some(key), Some(raw)) => {
            let value = parse_value(&raw);
            attrs.set(&key, value.clone())?;
            if fmt == OutputFormat::Text {
                println!("{} Set {} on {}", "✓".green().bold(), key.yellow(), node.name().cyan());
                return Ok(());
            }
            json!({ key: value })
        }
        (Some(key), None) => match attrs.get(&key)? {
            Some(value) => json!({ key: value }),
            None => bail!("no attribute {key:?} on {}", node.name()),
        },
        (None, _) => Value::Object(attrs.as_map()?),
    };
    match fmt {
        OutputFormat::Json => print_json(&shown),
        OutputFormat::Text => {
            if let Value::Object(map) = &shown {
                for (key, value) in map {
                    println!("{}: {}", key.yellow(), value);
                }
            }
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use arbor_hierarchy::HierarchyError;

    fn config_in(dir: &tempfile::TempDir) -> CliConfig {
        CliConfig::default().with_store(Some(dir.path().to_path_buf()))
    }

    #[test]
    fn parse_value_falls_back_to_string() {
        assert_eq!(parse_value("42"), json!(42));
        assert_eq!(parse_value("[1, 2]"), json!([1, 2]));
        assert_eq!(parse_value("\"quoted\""), json!("quoted"));
        assert_eq!(parse_value("m/s"), json!("m/s"));
    }

    #[test]
    fn read_commands_need_existing_store() {
        let dir = tempfile::tempdir().unwrap();
        let config = CliConfig::default().with_store(Some(dir.path().join("missing")));
        assert!(open_root(&config, OpenMode::Read).is_err());
        assert!(!dir.path().join("missing").exists());
    }

    #[test]
    fn init_then_mutate() {
        let dir = tempfile::tempdir().unwrap();
        let config = config_in(&dir);
        cmd_init(&config, InitArgs { overwrite: false }, OutputFormat::Json).unwrap();
        // Second init without overwrite refuses the existing group.
        assert!(cmd_init(&config, InitArgs { overwrite: false }, OutputFormat::Json).is_err());

        cmd_mkgroup(
            &config,
            MkgroupArgs { name: "sensors/north".into(), require: false },
            OutputFormat::Json,
        )
        .unwrap();
        cmd_mkarray(
            &config,
            MkarrayArgs {
                name: "sensors/north/temps".into(),
                shape: vec![4, 6],
                dtype: "<i4".into(),
                chunks: Some(vec![2, 3]),
                fill: Some("-1".into()),
                overwrite: false,
            },
            OutputFormat::Json,
        )
        .unwrap();

        let root = open_root(&config, OpenMode::Read).unwrap();
        let temps = root.get("sensors/north/temps").unwrap().into_array().unwrap();
        assert_eq!(temps.shape(), &[4, 6]);
        assert_eq!(temps.chunks(), &[2, 3]);
        assert_eq!(temps.dtype(), DType::Int32);
        assert_eq!(temps.fill_value(), &json!(-1));

        let north = resolve_group(root, Some("sensors/north")).unwrap();
        let all = LsArgs { path: None, groups: false, arrays: false };
        let names: Vec<String> = list_entries(&north, &all)
            .unwrap()
            .into_iter()
            .map(|e| e.name)
            .collect();
        assert_eq!(names, ["temps"]);
    }

    #[test]
    fn mkgroup_require_is_idempotent() {
        let dir = tempfile::tempdir().unwrap();
        let config = config_in(&dir);
        cmd_init(&config, InitArgs { overwrite: false }, OutputFormat::Json).unwrap();
        let args = || MkgroupArgs { name: "g".into(), require: true };
        cmd_mkgroup(&config, args(), OutputFormat::Json).unwrap();
        cmd_mkgroup(&config, args(), OutputFormat::Json).unwrap();
        let plain = MkgroupArgs { name: "g".into(), require: false };
        assert!(cmd_mkgroup(&config, plain, OutputFormat::Json).is_err());
    }

    #[test]
    fn ls_filters_by_kind() {
        let dir = tempfile::tempdir().unwrap();
        let config = config_in(&dir);
        let root = open_root(&config, OpenMode::Write).unwrap();
        root.create_group("b", false).unwrap();
        root.zeros("a", vec![2], DType::Int8, &Default::default()).unwrap();

        let kinds = |groups, arrays| -> Vec<(String, &'static str)> {
            let args = LsArgs { path: None, groups, arrays };
            list_entries(&root, &args)
                .unwrap()
                .into_iter()
                .map(|e| (e.name, e.kind))
                .collect()
        };
        assert_eq!(
            kinds(false, false),
            [("a".to_string(), "array"), ("b".to_string(), "group")]
        );
        assert_eq!(kinds(true, false), [("b".to_string(), "group")]);
        assert_eq!(kinds(false, true), [("a".to_string(), "array")]);
    }

    #[test]
    fn rm_and_attrs() {
        let dir = tempfile::tempdir().unwrap();
        let config = config_in(&dir);
        let root = open_root(&config, OpenMode::Write).unwrap();
        root.create_group("g/h", false).unwrap();

        let set = AttrsArgs {
            path: "g".into(),
            key: Some("units".into()),
            value: Some("m/s".into()),
        };
        cmd_attrs(&config, set, OutputFormat::Json).unwrap();
        let g = root.get("g").unwrap().into_group().unwrap();
        assert_eq!(g.attrs().get("units").unwrap(), Some(json!("m/s")));

        let missing = AttrsArgs { path: "g".into(), key: Some("nope".into()), value: None };
        assert!(cmd_attrs(&config, missing, OutputFormat::Json).is_err());

        cmd_rm(&config, RmArgs { name: "g".into() }, OutputFormat::Json).unwrap();
        assert!(!root.contains("g").unwrap());
        assert!(cmd_rm(&config, RmArgs { name: "g".into() }, OutputFormat::Json).is_err());
    }

    #[test]
    fn read_only_config_blocks_mutation() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = config_in(&dir);
        open_root(&config, OpenMode::Write).unwrap();
        config.read_only = true;

        let err = cmd_mkgroup(
            &config,
            MkgroupArgs { name: "g".into(), require: false },
            OutputFormat::Json,
        )
        .unwrap_err();
        assert!(matches!(
            err.downcast_ref::<HierarchyError>(),
            Some(HierarchyError::ReadOnly(_))
        ));
        assert!(!dir.path().join("g").exists());
    }
}
