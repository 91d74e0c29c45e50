use crate::acl::{ObjectIdentity, Permission, SecurityContext, Sid};
use crate::cli::output::{
    format_news_table, format_page_footer, format_postfix, format_tag_table, is_tty, page_json,
};
use crate::config::Config;
use crate::db::DbConnection;
use crate::error::RegisterError;
use crate::filter::parse_filter;
use crate::models::{schema_by_name, News, Tag};
use crate::query::{Entity, EntitySchema, Page, Pageable, Sort};
use crate::repo::{NewsRepo, PermissionRepo, TagRepo};
use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use rusqlite::{Connection, OptionalExtension};
use serde::Serialize;

#[derive(Parser)]
#[command(name = "register")]
#[command(about = "Member registry - filter expressions and permission-aware listings")]
#[command(version = env!("CARGO_PKG_VERSION"))]
pub struct Cli {
    /// Principal to act as
    #[arg(long = "as", value_name = "PRINCIPAL", env = "REGISTER_PRINCIPAL", global = true)]
    pub principal: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Parse a filter expression and print its postfix form
    Parse {
        /// Filter expression (e.g., "published:true AND subject:*show*")
        #[arg(trailing_var_arg = true, allow_hyphen_values = true, required = true)]
        filter: Vec<String>,
        /// Output in JSON format
        #[arg(long)]
        json: bool,
    },
    /// News commands
    News {
        #[command(subcommand)]
        subcommand: NewsCommands,
    },
    /// Tag commands
    Tag {
        #[command(subcommand)]
        subcommand: TagCommands,
    },
    /// Grant a permission on an object to a principal
    Grant(AclArgs),
    /// Revoke a permission on an object from a principal
    Revoke(AclArgs),
}

#[derive(Subcommand)]
pub enum NewsCommands {
    /// Add a news item
    Add {
        #[arg(long)]
        subject: String,
        #[arg(long)]
        text: String,
        #[arg(long)]
        published: bool,
        /// First visible day (YYYY-MM-DD)
        #[arg(long)]
        visible_from: Option<String>,
        /// Last visible day (YYYY-MM-DD)
        #[arg(long)]
        visible_to: Option<String>,
    },
    /// List news readable by the current principal
    List(ListArgs),
}

#[derive(Subcommand)]
pub enum TagCommands {
    /// Add a tag
    Add {
        #[arg(long)]
        name: String,
        #[arg(long)]
        description: Option<String>,
    },
    /// List tags readable by the current principal
    List(ListArgs),
}

#[derive(Args, Debug, Clone)]
pub struct ListArgs {
    /// Filter expression
    #[arg(long)]
    pub filter: Option<String>,
    /// Zero-based page number
    #[arg(long, default_value_t = 0)]
    pub page: u64,
    /// Page size (defaults to page.size from the rc file)
    #[arg(long)]
    pub size: Option<u64>,
    /// Sort order as "property[,asc|desc]"
    #[arg(long)]
    pub sort: Option<String>,
    /// Output in JSON format
    #[arg(long)]
    pub json: bool,
}

#[derive(Args, Debug, Clone)]
pub struct AclArgs {
    /// Entity type (news, tag)
    pub entity: String,
    /// Object id
    pub id: i64,
    /// Principal receiving or losing the permission
    pub recipient: String,
    /// Permission name (read, write, create, delete, administration) or mask
    pub permission: String,
}

pub fn run() -> Result<()> {
    let cli = Cli::parse();
    handle_command(cli)
}

fn handle_command(cli: Cli) -> Result<()> {
    let ctx = match &cli.principal {
        Some(principal) if !principal.trim().is_empty() => SecurityContext::for_principal(principal.trim()),
        _ => SecurityContext::anonymous(),
    };

    match cli.command {
        Commands::Parse { filter, json } => handle_parse(&filter.join(" "), json),
        Commands::News { subcommand } => handle_news(subcommand, &ctx),
        Commands::Tag { subcommand } => handle_tag(subcommand, &ctx),
        Commands::Grant(args) => handle_acl(args, true),
        Commands::Revoke(args) => handle_acl(args, false),
    }
}

fn handle_parse(filter: &str, json: bool) -> Result<()> {
    let tokens = parse_filter(filter);
    if json {
        println!("{}", serde_json::to_string_pretty(&tokens)?);
    } else if !tokens.is_empty() {
        println!("{}", format_postfix(&tokens));
    }
    Ok(())
}

fn handle_news(cmd: NewsCommands, ctx: &SecurityContext) -> Result<()> {
    let conn = DbConnection::connect().context("Failed to connect to database")?;

    match cmd {
        NewsCommands::Add { subject, text, published, visible_from, visible_to } => {
            let mut news = News::new(subject, text);
            news.published = published;
            news.visible_from = visible_from;
            news.visible_to = visible_to;
            news.created_by = current_principal(ctx);

            let news = NewsRepo::create(&conn, &news)?;
            let id = grant_creator(&conn, ctx, &news)?;

            println!("Created news {}", id);
            Ok(())
        }
        NewsCommands::List(args) => {
            let pageable = pageable_for(&args)?;
            let page = NewsRepo::find(&conn, ctx, args.filter.as_deref().unwrap_or(""), &pageable)?;
            print_page(&page, args.json, |content| format_news_table(content, is_tty()))
        }
    }
}

fn handle_tag(cmd: TagCommands, ctx: &SecurityContext) -> Result<()> {
    let conn = DbConnection::connect().context("Failed to connect to database")?;

    match cmd {
        TagCommands::Add { name, description } => {
            let mut tag = Tag::new(name);
            tag.description = description;
            tag.created_by = current_principal(ctx);

            let tag = TagRepo::create(&conn, &tag)?;
            let id = grant_creator(&conn, ctx, &tag)?;

            println!("Created tag '{}' (id: {})", tag.name, id);
            Ok(())
        }
        TagCommands::List(args) => {
            let pageable = pageable_for(&args)?;
            let page = TagRepo::find(&conn, ctx, args.filter.as_deref().unwrap_or(""), &pageable)?;
            print_page(&page, args.json, |content| format_tag_table(content, is_tty()))
        }
    }
}

fn handle_acl(args: AclArgs, grant: bool) -> Result<()> {
    let schema = schema_by_name(&args.entity)?;
    let permission = Permission::parse(&args.permission)?;
    let conn = DbConnection::connect().context("Failed to connect to database")?;

    ensure_exists(&conn, schema, args.id)?;
    let oid = ObjectIdentity::new(schema.acl_class, args.id);
    let recipient = Sid::principal(args.recipient.as_str());

    if grant {
        PermissionRepo::grant(&conn, &oid, &recipient, permission)?;
        println!("Granted {} on {} {} to {}", permission, schema.name, args.id, args.recipient);
    } else {
        PermissionRepo::revoke(&conn, &oid, &recipient, permission)?;
        println!("Revoked {} on {} {} from {}", permission, schema.name, args.id, args.recipient);
    }
    Ok(())
}

/// The acting principal's name, if any
fn current_principal(ctx: &SecurityContext) -> Option<String> {
    ctx.require_principal().ok().map(|sid| sid.name().to_string())
}

/// Creators can read what they add. Returns the stored entity's id.
fn grant_creator<T: Entity>(conn: &Connection, ctx: &SecurityContext, entity: &T) -> Result<i64> {
    let schema = T::schema();
    let id = entity.id().with_context(|| format!("Created {} has no id", schema.name))?;
    if let Ok(sid) = ctx.require_principal() {
        PermissionRepo::grant(conn, &ObjectIdentity::new(schema.acl_class, id), &sid, Permission::READ)?;
    }
    Ok(id)
}

fn ensure_exists(conn: &Connection, schema: &EntitySchema, id: i64) -> Result<()> {
    let sql = format!("SELECT 1 FROM {} WHERE {} = ?1", schema.table, schema.id_column);
    let found: Option<i64> = conn.query_row(&sql, [id], |row| row.get(0)).optional()?;
    match found {
        Some(_) => Ok(()),
        None => Err(RegisterError::NotFound { entity: schema.name.to_string(), id }.into()),
    }
}

fn pageable_for(args: &ListArgs) -> Result<Pageable> {
    let size = match args.size {
        Some(size) => size,
        None => Config::load()?.page_size,
    };
    let sort = match &args.sort {
        Some(spec) => Sort::parse(spec).with_context(|| format!("Invalid sort: '{}'", spec))?,
        None => Sort::unsorted(),
    };
    Ok(Pageable::sorted(args.page, size, sort))
}

fn print_page<T, F>(page: &Page<T>, json: bool, table: F) -> Result<()>
where
    T: Serialize,
    F: Fn(&[T]) -> String,
{
    if json {
        println!("{}", serde_json::to_string_pretty(&page_json(page)?)?);
    } else {
        println!("{}", table(&page.content));
        println!("{}", format_page_footer(page));
    }
    Ok(())
}
