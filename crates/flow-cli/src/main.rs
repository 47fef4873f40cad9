//! flowsync: offline driver for the flow node adapters
//!
//! Works on saved JSON snapshots instead of a live site, so reconciliation
//! and selector behavior can be inspected from a shell.

mod snapshot;

use anyhow::{bail, Context, Result};
use clap::{value_parser, Arg, ArgAction, ArgMatches, Command};
use flow_fields::{AttributeMap, ChangeSink, FieldName, ReconcileReport, Reconciler};
use flow_nodes::{
    EntityInfoNode, EntitySelector, FlowConfig, InfoRequest, ListFilter, ListNode, ListingKind,
    TemplateFilter, INFO_INPUTS, INFO_OUTPUTS,
};
use serde_json::{json, Map, Value};
use snapshot::{SnapshotRegistry, SnapshotSource};
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

/// Sink printing change events to stderr
struct StderrSink;

impl ChangeSink for StderrSink {
    fn field_changed(&mut self, name: &FieldName, value: &str) {
        eprintln!("changed {name} = {value}");
    }
}

fn cli() -> Command {
    Command::new("flowsync")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Reconcile node fields and selector choices against saved records")
        .subcommand_required(true)
        .arg_required_else_help(true)
        .subcommand(
            Command::new("reconcile")
                .about("Bring a field snapshot in line with an attribute set")
                .arg(
                    Arg::new("fields")
                        .long("fields")
                        .required(true)
                        .value_parser(value_parser!(PathBuf))
                        .help("JSON object of current field values"),
                )
                .arg(
                    Arg::new("attributes")
                        .long("attributes")
                        .required(true)
                        .value_parser(value_parser!(PathBuf))
                        .help("JSON object of record attributes"),
                )
                .arg(
                    Arg::new("static")
                        .long("static")
                        .action(ArgAction::Append)
                        .value_delimiter(',')
                        .help("Fields never touched"),
                )
                .arg(
                    Arg::new("connected")
                        .long("connected")
                        .action(ArgAction::Append)
                        .value_delimiter(',')
                        .help("Fields that are wired in the graph"),
                )
                .arg(
                    Arg::new("edit")
                        .long("edit")
                        .action(ArgAction::SetTrue)
                        .help("Expose attributes as editable inputs"),
                )
                .arg(
                    Arg::new("dry-run")
                        .long("dry-run")
                        .action(ArgAction::SetTrue)
                        .help("Print the plan without applying it"),
                ),
        )
        .subcommand(
            Command::new("choices")
                .about("Build selector choices from a saved collection response")
                .arg(
                    Arg::new("kind")
                        .long("kind")
                        .required(true)
                        .value_parser(value_parser!(ListingKind))
                        .help("assets, projects, tasks or users"),
                )
                .arg(
                    Arg::new("records")
                        .long("records")
                        .required(true)
                        .value_parser(value_parser!(PathBuf))
                        .help("Saved {\"data\": [...]} response"),
                )
                .arg(
                    Arg::new("previous")
                        .long("previous")
                        .help("Previously selected label"),
                )
                .arg(
                    Arg::new("asset-type")
                        .long("asset-type")
                        .help("Only assets of this type"),
                )
                .arg(
                    Arg::new("project")
                        .long("project")
                        .value_parser(value_parser!(i64))
                        .help("Only assets of this project"),
                )
                .arg(
                    Arg::new("show-templates")
                        .long("show-templates")
                        .action(ArgAction::SetTrue)
                        .help("Offer template projects too"),
                )
                .arg(
                    Arg::new("only-templates")
                        .long("only-templates")
                        .action(ArgAction::SetTrue)
                        .help("Offer template projects only"),
                ),
        )
        .subcommand(
            Command::new("info")
                .about("Run the entity info node against saved records")
                .arg(
                    Arg::new("records")
                        .long("records")
                        .required(true)
                        .value_parser(value_parser!(PathBuf))
                        .help("Saved {\"data\": [...]} response"),
                )
                .arg(
                    Arg::new("id")
                        .long("id")
                        .required(true)
                        .value_parser(value_parser!(i64))
                        .help("Record id"),
                )
                .arg(
                    Arg::new("type")
                        .long("type")
                        .help("Entity type; detected when omitted"),
                )
                .arg(
                    Arg::new("fields")
                        .long("fields")
                        .value_parser(value_parser!(PathBuf))
                        .help("JSON object of current field values"),
                ),
        )
        .subcommand(
            Command::new("check-config")
                .about("Load and validate site settings")
                .arg(
                    Arg::new("file")
                        .long("file")
                        .value_parser(value_parser!(PathBuf))
                        .help("TOML file with a [shotgrid] table"),
                ),
        )
}

fn read_object(path: &Path) -> Result<Map<String, Value>> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    match serde_json::from_str::<Value>(&text)
        .with_context(|| format!("invalid JSON in {}", path.display()))?
    {
        Value::Object(object) => Ok(object),
        _ => bail!("{} must hold a JSON object", path.display()),
    }
}

fn strings(args: &ArgMatches, id: &str) -> Vec<String> {
    args.get_many::<String>(id)
        .map(|values| values.cloned().collect())
        .unwrap_or_default()
}

fn report_json(report: &ReconcileReport) -> Value {
    let names = |list: &[FieldName]| list.iter().map(ToString::to_string).collect::<Vec<_>>();
    json!({
        "created": names(&report.created),
        "updated": names(&report.updated),
        "unchanged": names(&report.unchanged),
        "deleted": names(&report.deleted),
        "preserved": names(&report.preserved),
        "failures": report
            .failures
            .iter()
            .map(|f| json!({"field": f.field.to_string(), "error": f.error.to_string()}))
            .collect::<Vec<_>>(),
    })
}

fn run_reconcile(args: &ArgMatches) -> Result<Value> {
    let fields = read_object(args.get_one::<PathBuf>("fields").context("--fields is required")?)?;
    let attributes = AttributeMap::from_json_object(&read_object(
        args.get_one::<PathBuf>("attributes")
            .context("--attributes is required")?,
    )?);

    let base = if args.get_flag("edit") {
        Reconciler::edit("Entity")
    } else {
        Reconciler::display("Entity")
    };
    let reconciler = base.with_static(strings(args, "static"));
    let mut registry = SnapshotRegistry::from_json(&fields, &strings(args, "connected"));

    if args.get_flag("dry-run") {
        let plan = reconciler.plan(&registry, &attributes)?;
        return Ok(serde_json::to_value(plan)?);
    }

    let report = reconciler.reconcile(&mut registry, &mut StderrSink, &attributes)?;
    Ok(json!({
        "report": report_json(&report),
        "fields": registry.to_json(),
    }))
}

fn run_choices(args: &ArgMatches) -> Result<Value> {
    let kind = *args.get_one::<ListingKind>("kind").context("--kind is required")?;
    let path = args.get_one::<PathBuf>("records").context("--records is required")?;
    let body = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    let source = SnapshotSource::parse(&body)?;

    let mut filter = ListFilter::default().with_templates(TemplateFilter::from_toggles(
        args.get_flag("show-templates"),
        args.get_flag("only-templates"),
    ));
    if let Some(asset_type) = args.get_one::<String>("asset-type") {
        filter = filter.with_asset_type(asset_type);
    }
    if let Some(project) = args.get_one::<i64>("project") {
        filter = filter.with_project(*project);
    }

    let mut node = ListNode::new(kind).with_filter(filter);
    if let Some(previous) = args.get_one::<String>("previous") {
        node.restore(previous);
    }
    node.reload(&source, &mut StderrSink)?;

    let selector = node.selector();
    Ok(json!({
        "options": selector.options(),
        "selected": selector.current_label(),
        "selected_id": selector.selected().map(|c| c.payload.id),
    }))
}

fn run_info(args: &ArgMatches) -> Result<Value> {
    let path = args.get_one::<PathBuf>("records").context("--records is required")?;
    let body = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    let source = SnapshotSource::parse(&body)?;
    let id = *args.get_one::<i64>("id").context("--id is required")?;

    let target = match args.get_one::<String>("type") {
        Some(name) => EntitySelector::Known(name.parse()?),
        None => EntitySelector::Unknown,
    };
    let mut fields: Map<String, Value> = INFO_INPUTS
        .iter()
        .chain(&INFO_OUTPUTS)
        .map(|name| ((*name).to_string(), Value::String(String::new())))
        .collect();
    if let Some(path) = args.get_one::<PathBuf>("fields") {
        fields.extend(read_object(path)?);
    }
    let mut registry = SnapshotRegistry::from_json(&fields, &[]);

    let config = FlowConfig::load(None)?.shotgrid;
    let request = InfoRequest {
        target,
        entity_id: Some(id),
        fields: Vec::new(),
    };
    let outcome = EntityInfoNode::new(config).refresh(&request, &source, &mut registry, &mut StderrSink)?;

    Ok(json!({
        "entity_type": outcome.entity_type.name(),
        "report": report_json(&outcome.report),
        "fields": registry.to_json(),
    }))
}

fn run_check_config(args: &ArgMatches) -> Result<Value> {
    let file = FlowConfig::load(args.get_one::<PathBuf>("file").map(PathBuf::as_path))?;
    file.shotgrid.validate()?;
    Ok(json!({
        "base_url": file.shotgrid.base_url,
        "script_name": file.shotgrid.script_name,
        "api_key": file.shotgrid.masked_api_key(),
        "reconciler": file.reconciler,
    }))
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let matches = cli().get_matches();
    let output = match matches.subcommand() {
        Some(("reconcile", args)) => run_reconcile(args)?,
        Some(("choices", args)) => run_choices(args)?,
        Some(("info", args)) => run_info(args)?,
        Some(("check-config", args)) => run_check_config(args)?,
        Some((other, _)) => bail!("unknown command: {other}"),
        None => bail!("no command given"),
    };

    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cli_definition_is_consistent() {
        cli().debug_assert();
    }

    #[test]
    fn static_list_accepts_commas() {
        let matches = cli()
            .try_get_matches_from([
                "flowsync",
                "reconcile",
                "--fields",
                "f.json",
                "--attributes",
                "a.json",
                "--static",
                "entity_id,entity_url",
                "--static",
                "exec_in",
            ])
            .unwrap();
        let (_, args) = matches.subcommand().unwrap();
        assert_eq!(strings(args, "static"), vec!["entity_id", "entity_url", "exec_in"]);
    }

    #[test]
    fn reconcile_command_applies_changes() {
        let dir = tempfile::tempdir().unwrap();
        let fields = dir.path().join("fields.json");
        let attributes = dir.path().join("attributes.json");
        std::fs::write(&fields, r#"{"entity_id": "4", "code": "old", "gone": "x"}"#).unwrap();
        std::fs::write(&attributes, r#"{"code": "new", "sg_status_list": "ip"}"#).unwrap();

        let matches = cli()
            .try_get_matches_from([
                "flowsync",
                "reconcile",
                "--fields",
                fields.to_str().unwrap(),
                "--attributes",
                attributes.to_str().unwrap(),
                "--static",
                "entity_id",
            ])
            .unwrap();
        let (_, args) = matches.subcommand().unwrap();
        let output = run_reconcile(args).unwrap();

        assert_eq!(output["report"]["updated"], json!(["code"]));
        assert_eq!(output["report"]["created"], json!(["sg_status_list"]));
        assert_eq!(output["report"]["deleted"], json!(["gone"]));
        assert_eq!(output["fields"]["entity_id"], json!("4"));
    }
}
