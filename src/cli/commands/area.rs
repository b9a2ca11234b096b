//! Expertise area CLI commands.

use anyhow::{bail, Result};
use clap::{Args, Subcommand};

use crate::adapters::sqlite::SqliteExpertiseAreaRepository;
use crate::cli::context::AppContext;
use crate::cli::output::{list_table, or_dash, output, render_list, truncate, CommandOutput};
use crate::domain::models::{ExpertiseArea, ExpertiseAreaNode, ExpertiseAreaUpdate, NewExpertiseArea};
use crate::services::ExpertiseAreaService;

const TREE_BRANCH: &str = "├── ";
const TREE_LAST: &str = "└── ";
const TREE_PIPE: &str = "│   ";
const TREE_SPACE: &str = "    ";

#[derive(Args, Debug)]
pub struct AreaArgs {
    #[command(subcommand)]
    pub command: AreaCommands,
}

#[derive(Subcommand, Debug)]
pub enum AreaCommands {
    /// Create an expertise area
    Create {
        /// Area name
        name: String,
        /// URL slug (derived from the name when omitted)
        #[arg(long)]
        slug: Option<String>,
        /// Area description
        #[arg(short, long)]
        description: Option<String>,
        /// Parent area ID or slug
        #[arg(short, long)]
        parent: Option<String>,
    },
    /// Show an area with its children and linked profile count
    Show {
        /// Area ID or slug
        area: String,
    },
    /// List areas
    List {
        /// Include inactive areas
        #[arg(short, long)]
        all: bool,
    },
    /// Show the area hierarchy
    Tree {
        /// Include inactive areas
        #[arg(short, long)]
        all: bool,
    },
    /// Show the ancestry of an area, root first
    Path {
        /// Area ID or slug
        area: String,
    },
    /// Update an area
    Update {
        /// Area ID or slug
        area: String,
        #[arg(long)]
        name: Option<String>,
        #[arg(long)]
        slug: Option<String>,
        #[arg(short, long)]
        description: Option<String>,
        /// New parent area ID or slug
        #[arg(short, long, conflicts_with = "root")]
        parent: Option<String>,
        /// Detach the area from its parent
        #[arg(long)]
        root: bool,
        /// Mark the area active or inactive
        #[arg(long)]
        active: Option<bool>,
    },
    /// Delete an area without children
    Delete {
        /// Area ID or slug
        area: String,
    },
}

#[derive(Debug, serde::Serialize)]
pub struct AreaOutput {
    pub id: String,
    pub name: String,
    pub slug: String,
    pub description: Option<String>,
    pub parent_id: Option<String>,
    pub is_active: bool,
}

impl From<&ExpertiseArea> for AreaOutput {
    fn from(area: &ExpertiseArea) -> Self {
        Self {
            id: area.id.clone(),
            name: area.name.clone(),
            slug: area.slug.clone(),
            description: area.description.clone(),
            parent_id: area.parent_id.clone(),
            is_active: area.is_active,
        }
    }
}

#[derive(Debug, serde::Serialize)]
pub struct AreaListOutput {
    pub areas: Vec<AreaOutput>,
    pub total: usize,
}

impl CommandOutput for AreaListOutput {
    fn to_human(&self) -> String {
        let mut table = list_table(&["id", "name", "slug", "parent", "active"]);
        for area in &self.areas {
            table.add_row(vec![
                area.id.clone(),
                truncate(&area.name, 32),
                area.slug.clone(),
                or_dash(area.parent_id.as_deref()),
                if area.is_active { "yes" } else { "no" }.to_string(),
            ]);
        }
        render_list("area", table, self.total)
    }

    fn to_json(&self) -> serde_json::Value {
        serde_json::to_value(self).unwrap_or_default()
    }
}

#[derive(Debug, serde::Serialize)]
pub struct AreaDetailOutput {
    pub area: AreaOutput,
    pub children: Vec<AreaOutput>,
    pub users_count: u64,
}

impl CommandOutput for AreaDetailOutput {
    fn to_human(&self) -> String {
        let mut lines = vec![
            format!("Area: {}", self.area.name),
            format!("ID: {}", self.area.id),
            format!("Slug: {}", self.area.slug),
            format!("Active: {}", self.area.is_active),
            format!("Profiles: {}", self.users_count),
        ];
        if let Some(description) = &self.area.description {
            lines.push(format!("Description: {description}"));
        }
        if let Some(parent) = &self.area.parent_id {
            lines.push(format!("Parent: {parent}"));
        }
        if !self.children.is_empty() {
            lines.push("\nChildren:".to_string());
            for child in &self.children {
                lines.push(format!("  - {} ({})", child.name, child.id));
            }
        }
        lines.join("\n")
    }

    fn to_json(&self) -> serde_json::Value {
        serde_json::to_value(self).unwrap_or_default()
    }
}

#[derive(Debug, serde::Serialize)]
pub struct AreaTreeOutput {
    pub tree: Vec<ExpertiseAreaNode>,
}

impl CommandOutput for AreaTreeOutput {
    fn to_human(&self) -> String {
        if self.tree.is_empty() {
            return "No areas found.".to_string();
        }
        let mut out = String::new();
        for root in &self.tree {
            render_node(root, "", true, true, &mut out);
        }
        out.trim_end().to_string()
    }

    fn to_json(&self) -> serde_json::Value {
        serde_json::to_value(self).unwrap_or_default()
    }
}

fn render_node(node: &ExpertiseAreaNode, prefix: &str, is_root: bool, is_last: bool, out: &mut String) {
    let connector = match (is_root, is_last) {
        (true, _) => "",
        (false, true) => TREE_LAST,
        (false, false) => TREE_BRANCH,
    };
    let inactive = if node.area.is_active { "" } else { " (inactive)" };
    out.push_str(&format!(
        "{prefix}{connector}{} [{}]{inactive}\n",
        node.area.name, node.area.slug
    ));

    let child_prefix = match (is_root, is_last) {
        (true, _) => String::new(),
        (false, true) => format!("{prefix}{TREE_SPACE}"),
        (false, false) => format!("{prefix}{TREE_PIPE}"),
    };
    let count = node.children.len();
    for (i, child) in node.children.iter().enumerate() {
        render_node(child, &child_prefix, false, i + 1 == count, out);
    }
}

#[derive(Debug, serde::Serialize)]
pub struct AreaPathOutput {
    pub path: Vec<AreaOutput>,
}

impl CommandOutput for AreaPathOutput {
    fn to_human(&self) -> String {
        self.path
            .iter()
            .map(|a| a.name.as_str())
            .collect::<Vec<_>>()
            .join(" > ")
    }

    fn to_json(&self) -> serde_json::Value {
        serde_json::to_value(self).unwrap_or_default()
    }
}

#[derive(Debug, serde::Serialize)]
pub struct AreaActionOutput {
    pub success: bool,
    pub message: String,
    pub area: Option<AreaOutput>,
}

impl CommandOutput for AreaActionOutput {
    fn to_human(&self) -> String {
        self.message.clone()
    }

    fn to_json(&self) -> serde_json::Value {
        serde_json::to_value(self).unwrap_or_default()
    }
}

/// Resolve an `exp_` id or a slug to an area.
pub(crate) async fn resolve_area(
    service: &ExpertiseAreaService<SqliteExpertiseAreaRepository>,
    key: &str,
) -> Result<ExpertiseArea> {
    let area = if key.starts_with("exp_") {
        service.get(key).await?
    } else {
        service.get_by_slug(key).await?
    };
    Ok(area)
}

pub async fn execute(args: AreaArgs, ctx: &AppContext, json_mode: bool) -> Result<()> {
    let service = ctx.area_service();

    match args.command {
        AreaCommands::Create {
            name,
            slug,
            description,
            parent,
        } => {
            let parent_id = match parent {
                Some(key) => Some(resolve_area(&service, &key).await?.id),
                None => None,
            };
            let area = service
                .create(NewExpertiseArea {
                    name,
                    slug,
                    description,
                    parent_id,
                })
                .await?;
            output(
                &AreaActionOutput {
                    success: true,
                    message: format!("Area created: {} ({})", area.name, area.id),
                    area: Some(AreaOutput::from(&area)),
                },
                json_mode,
            );
        }
        AreaCommands::Show { area } => {
            let area = resolve_area(&service, &area).await?;
            let children = service.children(&area.id).await?;
            let users_count = service.users_count(&area.id).await?;
            output(
                &AreaDetailOutput {
                    area: AreaOutput::from(&area),
                    children: children.iter().map(AreaOutput::from).collect(),
                    users_count,
                },
                json_mode,
            );
        }
        AreaCommands::List { all } => {
            let areas = service.list(!all).await?;
            let total = areas.len();
            output(
                &AreaListOutput {
                    areas: areas.iter().map(AreaOutput::from).collect(),
                    total,
                },
                json_mode,
            );
        }
        AreaCommands::Tree { all } => {
            let tree = service.tree(!all).await?;
            output(&AreaTreeOutput { tree }, json_mode);
        }
        AreaCommands::Path { area } => {
            let area = resolve_area(&service, &area).await?;
            let path = service.path_to_root(&area.id).await?;
            output(
                &AreaPathOutput {
                    path: path.iter().map(AreaOutput::from).collect(),
                },
                json_mode,
            );
        }
        AreaCommands::Update {
            area,
            name,
            slug,
            description,
            parent,
            root,
            active,
        } => {
            let area = resolve_area(&service, &area).await?;
            let parent_id = match (parent, root) {
                (Some(key), _) => Some(Some(resolve_area(&service, &key).await?.id)),
                (None, true) => Some(None),
                (None, false) => None,
            };
            let update = ExpertiseAreaUpdate {
                name,
                slug,
                description,
                parent_id,
                is_active: active,
            };
            if update.name.is_none()
                && update.slug.is_none()
                && update.description.is_none()
                && update.parent_id.is_none()
                && update.is_active.is_none()
            {
                bail!("Nothing to update. Pass at least one of --name, --slug, --description, --parent, --root, --active.");
            }
            let updated = service.update(&area.id, update).await?;
            output(
                &AreaActionOutput {
                    success: true,
                    message: format!("Area updated: {} ({})", updated.name, updated.id),
                    area: Some(AreaOutput::from(&updated)),
                },
                json_mode,
            );
        }
        AreaCommands::Delete { area } => {
            let area = resolve_area(&service, &area).await?;
            service.delete(&area.id).await?;
            output(
                &AreaActionOutput {
                    success: true,
                    message: format!("Area deleted: {} ({})", area.name, area.id),
                    area: None,
                },
                json_mode,
            );
        }
    }

    Ok(())
}
