use std::path::PathBuf;

use advreport_core::ItemId;
use clap::{ArgAction, Parser};

#[derive(Parser, Debug, Clone)]
#[command(
    name = "advreport",
    version,
    about = "Replay a report view against recorded backend responses",
    long_about = "Drives the report interaction controller against a directory of recorded backend responses and prints the resulting view state.\n\nExamples:\n  advreport ./fixtures\n  advreport ./fixtures '?status=open&page=2' --expand 5\n  advreport ./fixtures --action 5:approve\n  advreport ./fixtures --bulk archive:5,6 --form-data 'reason=old' --confirm"
)]
pub struct CliArgs {
    #[arg(value_name = "FIXTURES", help = "Directory of recorded backend responses.")]
    pub fixtures: PathBuf,

    #[arg(
        value_name = "QUERY",
        help = "Initial query string, e.g. '?status=open&page=2'."
    )]
    pub query: Option<String>,

    #[arg(
        long,
        value_name = "PATH",
        help_heading = "Input",
        help = "Controller config file (TOML). Defaults to the user config dir."
    )]
    pub config: Option<PathBuf>,

    #[arg(
        long,
        value_name = "ID",
        action = ArgAction::Append,
        help_heading = "Interaction",
        help = "Toggle expansion of an item (repeatable)."
    )]
    pub expand: Vec<String>,

    #[arg(
        long,
        value_name = "ID:METHOD",
        value_parser = parse_action_ref,
        action = ArgAction::Append,
        help_heading = "Interaction",
        help = "Run an item action (repeatable)."
    )]
    pub action: Vec<ActionRef>,

    #[arg(
        long,
        value_name = "METHOD:ID,ID",
        value_parser = parse_bulk_ref,
        help_heading = "Interaction",
        help = "Select items and run a bulk action on them."
    )]
    pub bulk: Option<BulkRef>,

    #[arg(
        long,
        value_name = "DATA",
        help_heading = "Interaction",
        help = "Serialized form data submitted to any form an action opens."
    )]
    pub form_data: Option<String>,

    #[arg(
        long,
        help_heading = "Interaction",
        help = "Confirm actions that ask for confirmation."
    )]
    pub confirm: bool,
}

/// `ID:METHOD`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActionRef {
    pub item_id: ItemId,
    pub method: String,
}

/// `METHOD:ID,ID`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BulkRef {
    pub method: String,
    pub item_ids: Vec<ItemId>,
}

fn parse_action_ref(s: &str) -> Result<ActionRef, String> {
    let (id, method) = s
        .split_once(':')
        .ok_or_else(|| format!("expected ID:METHOD, got '{}'", s))?;
    if id.is_empty() || method.is_empty() {
        return Err(format!("expected ID:METHOD, got '{}'", s));
    }
    Ok(ActionRef {
        item_id: ItemId::from(id),
        method: method.to_string(),
    })
}

fn parse_bulk_ref(s: &str) -> Result<BulkRef, String> {
    let (method, ids) = s
        .split_once(':')
        .ok_or_else(|| format!("expected METHOD:ID,ID, got '{}'", s))?;
    let item_ids: Vec<ItemId> = ids
        .split(',')
        .map(str::trim)
        .filter(|id| !id.is_empty())
        .map(ItemId::from)
        .collect();
    if method.is_empty() || item_ids.is_empty() {
        return Err(format!("expected METHOD:ID,ID, got '{}'", s));
    }
    Ok(BulkRef {
        method: method.to_string(),
        item_ids,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_action_ref() {
        assert_eq!(
            parse_action_ref("5:approve").unwrap(),
            ActionRef {
                item_id: ItemId::from("5"),
                method: "approve".into(),
            }
        );
        assert!(parse_action_ref("5").is_err());
        assert!(parse_action_ref(":approve").is_err());
    }

    #[test]
    fn test_parse_bulk_ref() {
        let bulk = parse_bulk_ref("archive:5, 6,").unwrap();
        assert_eq!(bulk.method, "archive");
        assert_eq!(bulk.item_ids, vec![ItemId::from("5"), ItemId::from("6")]);
        assert!(parse_bulk_ref("archive:").is_err());
        assert!(parse_bulk_ref("archive").is_err());
    }

    #[test]
    fn test_cli_parsing() {
        let args = CliArgs::try_parse_from([
            "advreport",
            "fixtures",
            "?page=2",
            "--expand",
            "5",
            "--expand",
            "6",
            "--action",
            "5:approve",
            "--bulk",
            "archive:5,6",
            "--confirm",
        ])
        .unwrap();

        assert_eq!(args.fixtures, PathBuf::from("fixtures"));
        assert_eq!(args.query.as_deref(), Some("?page=2"));
        assert_eq!(args.expand, vec!["5".to_string(), "6".to_string()]);
        assert_eq!(args.action.len(), 1);
        assert_eq!(args.bulk.unwrap().method, "archive");
        assert!(args.confirm);
        assert!(args.form_data.is_none());
    }

    #[test]
    fn test_cli_rejects_bad_action() {
        assert!(CliArgs::try_parse_from(["advreport", "fixtures", "--action", "oops"]).is_err());
    }
}
