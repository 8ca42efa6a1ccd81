use anyhow::{anyhow, bail, Context, Result};
use chrono::Utc;
use serde::Serialize;
use std::io::{self, BufRead, Write};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{debug, info};

use crate::api::{ArchiveApi, ArchiveClient};
use crate::audit::{AuditAction, AuditTrail};
use crate::export;
use crate::models::{
    AuditLogCreate, CaseDetail, Config, ExportRequest, IntegrityStatus, NewCase, NewHold, NewOrganization,
    NewRetentionPolicy, Role,
};
use crate::search::{hold_criteria, split_list, Pager, SearchFilters, SearchRequest};
use crate::selection::Selection;
use crate::session::Session;
use crate::ui::{self, components::format_bytes, views::admin::slugify};
use crate::workflows::{UserDraft, Workflows};

use super::{
    AuditCommand, CaseCommand, Cli, Command, HoldCommand, MessageCommand, OrgCommand, RetentionCommand,
    SearchArgs, UserCommand,
};

/// Prompt user for yes/no input
fn prompt_user(message: &str) -> Result<bool> {
    print!("{}", message);
    io::stdout().flush()?;

    let mut input = String::new();
    io::stdin().read_line(&mut input)?;

    Ok(input.trim().to_lowercase().starts_with('y'))
}

fn read_line(message: &str) -> Result<String> {
    eprint!("{}", message);
    io::stderr().flush()?;
    let mut input = String::new();
    io::stdin().lock().read_line(&mut input)?;
    Ok(input.trim_end_matches(['\r', '\n']).to_string())
}

/// Shared state for one CLI invocation
struct Invocation {
    config: Config,
    session_path: PathBuf,
    yes: bool,
    json: bool,
}

impl Invocation {
    fn confirm(&self, question: &str) -> Result<bool> {
        if self.yes {
            return Ok(true);
        }
        prompt_user(&format!("{} (y/n): ", question))
    }

    fn print_json<T: Serialize>(&self, value: &T) -> Result<bool> {
        if self.json {
            println!("{}", serde_json::to_string_pretty(value)?);
        }
        Ok(self.json)
    }

    fn anonymous_client(&self) -> Result<ArchiveClient> {
        ArchiveClient::new(&self.config)
    }

    fn authenticated(&self) -> Result<(Session, ArchiveClient)> {
        let session = Session::require(&self.session_path)?;
        let client = ArchiveClient::new(&self.config)?.with_token(session.access_token.clone());
        Ok((session, client))
    }
}

/// Execute a parsed command line
pub async fn run(cli: Cli, mut config: Config) -> Result<()> {
    if let Some(api_url) = cli.api_url {
        url::Url::parse(&api_url).with_context(|| format!("Invalid --api-url {}", api_url))?;
        config.api_url = api_url;
    }
    let session_path = cli
        .session
        .unwrap_or_else(|| PathBuf::from(&config.session_path));
    let ctx = Invocation {
        config,
        session_path,
        yes: cli.yes,
        json: cli.json,
    };
    debug!("Using archive API at {}", ctx.config.api_url);

    match cli.command {
        Command::Login { username, password } => login(&ctx, username, password).await,
        Command::Logout => logout(&ctx),
        Command::Whoami => whoami(&ctx),
        Command::Search(args) => search(&ctx, args).await,
        Command::Message(cmd) => message(&ctx, cmd).await,
        Command::Cases(cmd) => cases(&ctx, cmd).await,
        Command::Holds(cmd) => holds(&ctx, cmd).await,
        Command::Audit(cmd) => audit(&ctx, cmd).await,
        Command::Users(cmd) => users(&ctx, cmd).await,
        Command::Orgs(cmd) => orgs(&ctx, cmd).await,
        Command::Agents => agents(&ctx).await,
        Command::Analytics => analytics(&ctx).await,
        Command::Stats => stats(&ctx).await,
        Command::Retention(cmd) => retention(&ctx, cmd).await,
        Command::Health => health(&ctx).await,
        Command::Dashboard => dashboard(&ctx).await,
    }
}

async fn login(ctx: &Invocation, username: String, password: Option<String>) -> Result<()> {
    let password = match password {
        Some(password) => password,
        None => read_line("Password: ")?,
    };
    let outcome = ctx.anonymous_client()?.login(&username, &password).await?;
    let session = Session::from(outcome);
    session.save(&ctx.session_path)?;

    println!("✅ Logged in as {} ({})", session.user.username, session.role());
    if session.access_token.is_none() {
        println!("⚠️  The server issued no access token; requests are sent without authorization");
    }
    Ok(())
}

fn logout(ctx: &Invocation) -> Result<()> {
    if Session::clear(&ctx.session_path)? {
        println!("👋 Logged out");
    } else {
        println!("Not logged in");
    }
    Ok(())
}

fn whoami(ctx: &Invocation) -> Result<()> {
    let session = Session::require(&ctx.session_path)?;
    if ctx.print_json(&session.user)? {
        return Ok(());
    }
    let user = &session.user;
    println!("👤 {} (id {})", user.username, user.id);
    println!("   Role:         {}", user.role);
    println!(
        "   Organization: {}",
        user.org_id.map(|id| id.to_string()).unwrap_or_else(|| "-".to_string())
    );
    if !user.domains.is_empty() {
        println!("   Domains:      {}", user.domains.join(", "));
    }
    let pages: Vec<&str> = session.navigation().iter().map(|n| n.label).collect();
    println!("   Dashboard:    {}", pages.join(" | "));
    Ok(())
}

fn search_request(session: &Session, args: &SearchArgs, page_size: usize) -> Result<SearchRequest> {
    let filters = SearchFilters {
        from: args.from.clone().unwrap_or_default(),
        to: args.to.clone().unwrap_or_default(),
        date_start: args.date_start.clone().unwrap_or_default(),
        date_end: args.date_end.clone().unwrap_or_default(),
        has_attachments: args.has_attachments,
        is_spam: args.spam,
        direction: args.direction,
        attachment_keyword: args.attachment_keyword.clone().unwrap_or_default(),
    };
    let mut pager = Pager::new(args.limit.unwrap_or(page_size));
    pager.page = args.page.max(1);

    Ok(SearchRequest::new(session.require_org()?, args.query.clone())
        .with_user_domain(session.user_domain())
        .with_filters(filters)
        .with_page(&pager))
}

async fn search(ctx: &Invocation, args: SearchArgs) -> Result<()> {
    let (session, client) = ctx.authenticated()?;
    let flows = Workflows::new(&client, &session);
    let request = search_request(&session, &args, ctx.config.page_size)?;
    let results = flows.search(&request).await?;

    if let Some(path) = &args.export {
        let rows: Vec<_> = results.hits.iter().collect();
        let count = export::export_to_file(path, &rows)?;
        flows.record_export(count, false).await;
        println!("💾 Exported {} messages to {}", count, path.display());
    }

    if ctx.print_json(&results)? {
        return Ok(());
    }
    let mut pager = Pager::new(request.limit);
    pager.page = args.page.max(1);
    pager.total = results.estimated_total_hits;

    println!("🔍 {} (page {} of {})", pager.range_label(results.hits.len()), pager.page, pager.total_pages());
    for hit in &results.hits {
        let mut flags = String::new();
        if hit.has_attachments {
            flags.push('📎');
        }
        if hit.is_on_hold {
            flags.push('🔒');
        }
        println!(
            "{:<24} {:<16} {:<28} {} {}",
            ui::components::truncate(&hit.id, 24),
            hit.date.as_ref().map(|d| d.to_string()).unwrap_or_default(),
            ui::components::truncate(&hit.from, 28),
            hit.subject_label(),
            flags
        );
    }
    Ok(())
}

async fn message(ctx: &Invocation, cmd: MessageCommand) -> Result<()> {
    let (session, client) = ctx.authenticated()?;
    let org_id = session.require_org()?;

    match cmd {
        MessageCommand::Show { id } => {
            let view = Workflows::new(&client, &session).load_message(&id).await?;
            if ctx.print_json(&view.message)? {
                return Ok(());
            }
            let badge = match view.integrity.status {
                IntegrityStatus::Valid => "✅ VALID",
                IntegrityStatus::Tampered => "❌ TAMPERED",
                IntegrityStatus::Error => "⚠️  ERROR",
                IntegrityStatus::Unavailable => "❔ UNAVAILABLE",
            };
            println!("📧 Message {}", id);
            println!("   Integrity: {}", badge);
            if let Some(scan) = view.pii.as_ref().filter(|s| s.pii_detected) {
                let labels: Vec<&str> = scan.entities.iter().map(|e| e.label.as_str()).collect();
                println!("   PII:       {}", labels.join(", "));
            }
            for attachment in &view.message.attachments {
                println!("   📎 {} ({})", attachment.filename, format_bytes(attachment.size));
            }
            println!("   Thread:    {} other messages", view.thread.len());
            println!();
            println!("{}", view.body);
        }
        MessageCommand::Thread { id } => {
            let thread = client.message_thread(org_id, &id).await?;
            if ctx.print_json(&thread)? {
                return Ok(());
            }
            for hit in &thread {
                println!(
                    "{:<16} {:<28} {}",
                    hit.date.as_ref().map(|d| d.to_string()).unwrap_or_default(),
                    ui::components::truncate(&hit.from, 28),
                    hit.subject_label()
                );
            }
        }
        MessageCommand::Headers { id } => {
            let headers = client.message_headers(org_id, &id).await?;
            if ctx.print_json(&headers)? {
                return Ok(());
            }
            for header in &headers {
                println!("{}: {}", header.name, header.value);
            }
        }
        MessageCommand::Redacted { id } => {
            let preview = client.preview_redacted(org_id, &id).await?;
            if ctx.print_json(&preview)? {
                return Ok(());
            }
            println!("{}", preview.redacted.as_deref().unwrap_or("Redacted preview unavailable"));
        }
        MessageCommand::Pii { id } => {
            let scan = client.pii_scan(org_id, &id).await?;
            if ctx.print_json(&scan)? {
                return Ok(());
            }
            if !scan.pii_detected {
                println!("✅ No PII detected");
            }
            for entity in &scan.entities {
                println!("⚠️  {}: {}", entity.label, entity.text.as_deref().unwrap_or(""));
            }
        }
        MessageCommand::Verify { id } => {
            let report = client.verify_message(org_id, &id).await?;
            if ctx.print_json(&report)? {
                return Ok(());
            }
            println!("🔐 {} {}", id, report.status);
            if let Some(error) = &report.error {
                println!("   {}", error);
            }
        }
    }
    Ok(())
}

async fn case_detail(client: &ArchiveClient, org_id: i64, case_id: i64) -> Result<CaseDetail> {
    Ok(client.get_case(org_id, case_id).await?)
}

async fn cases(ctx: &Invocation, cmd: CaseCommand) -> Result<()> {
    let (session, client) = ctx.authenticated()?;
    let flows = Workflows::new(&client, &session);

    match cmd {
        CaseCommand::List => {
            let cases = client.list_cases(session.require_org()?).await?;
            if ctx.print_json(&cases)? {
                return Ok(());
            }
            for case in &cases {
                println!("{:>5}  {:<8} {:>5} items  {}", case.id, case.status, case.item_count, case.name);
            }
        }
        CaseCommand::Create { name, description } => {
            let case = NewCase {
                name,
                description,
                created_by: session.user.username.clone(),
            };
            let created = client.create_case(session.require_org()?, &case).await?;
            println!("✅ Created case {} ({})", created.name, created.id);
        }
        CaseCommand::Show { id } => {
            let detail = case_detail(&client, session.require_org()?, id).await?;
            if ctx.print_json(&detail)? {
                return Ok(());
            }
            println!("📁 {} [{}]", detail.case.name, detail.case.status);
            if let Some(description) = &detail.case.description {
                println!("   {}", description);
            }
            for item in &detail.items {
                println!(
                    "{:>6}  {:<36} {:<10} {:<16} {}",
                    item.id,
                    item.message_id,
                    item.review_status,
                    item.assignee_name.as_deref().unwrap_or("-"),
                    item.tags.join(", ")
                );
            }
        }
        CaseCommand::Delete { id } => {
            if !ctx.confirm(&format!("Delete case {} and its review items?", id))? {
                println!("Cancelled");
                return Ok(());
            }
            client.delete_case(session.require_org()?, id).await?;
            println!("🗑️  Deleted case {}", id);
        }
        CaseCommand::Add { case_id, message_ids } => {
            let mut selection = Selection::new();
            for id in message_ids {
                selection.toggle(id);
            }
            let count = flows.add_to_case(Some(case_id), &mut selection).await?;
            println!("✅ Added {} messages to case {}", count, case_id);
        }
        CaseCommand::Export {
            id,
            format,
            redact,
            output,
        } => {
            let ticket = client
                .export_case(session.require_org()?, id, &ExportRequest { format, redact })
                .await?;
            match output {
                Some(path) => {
                    let bytes = client.download(&ticket.download_url).await?;
                    std::fs::write(&path, &bytes).with_context(|| format!("Writing {}", path.display()))?;
                    println!("💾 Saved {} ({}) to {}", format, format_bytes(bytes.len() as u64), path.display());
                }
                None => println!("📦 Export ready: {}", ticket.download_url),
            }
        }
        CaseCommand::Tag { case_id, item_id, tag } => {
            let mut detail = case_detail(&client, session.require_org()?, case_id).await?;
            if flows.add_tag(&mut detail, item_id, &tag).await? {
                let tags = detail.items.iter().find(|i| i.id == item_id).map(|i| i.tags.join(", "));
                println!("🏷️  Item {} tags: {}", item_id, tags.unwrap_or_default());
            } else {
                bail!("Nothing to tag: item {} is not in case {} or the tag is empty", item_id, case_id);
            }
        }
        CaseCommand::Status { item_id, status } => {
            client.update_item_status(item_id, status).await?;
            println!("✅ Item {} is now {}", item_id, status);
        }
        CaseCommand::RemoveItem { case_id, item_id } => {
            if !ctx.confirm(&format!("Remove item {} from case {}?", item_id, case_id))? {
                println!("Cancelled");
                return Ok(());
            }
            let mut detail = case_detail(&client, session.require_org()?, case_id).await?;
            flows.remove_item(&mut detail, item_id).await?;
            println!("🗑️  Removed item {} ({} items left)", item_id, detail.items.len());
        }
        CaseCommand::Assign { case_id, to, item_ids } => {
            let org_id = session.require_org()?;
            let assignee = client
                .list_users(Some(org_id))
                .await?
                .into_iter()
                .find(|u| u.id == to && u.role == Role::Auditor)
                .ok_or_else(|| anyhow!("User {} is not an auditor in your organization", to))?;
            let mut detail = case_detail(&client, org_id, case_id).await?;
            flows.assign_items(&mut detail, &item_ids, &assignee).await?;
            println!("✅ Assigned {} items to {}", item_ids.len(), assignee.username);
        }
        CaseCommand::Assignments => {
            let assignments = client.list_assignments(session.user.id).await?;
            if ctx.print_json(&assignments)? {
                return Ok(());
            }
            let stats = crate::models::ReviewStats::from_assignments(&assignments);
            println!(
                "📋 {} assigned: {} pending, {} in review, {} completed",
                stats.total, stats.pending, stats.in_review, stats.completed
            );
            for a in &assignments {
                println!("{:>6}  {:<36} {:<10} {}", a.id, a.message_id, a.review_status, a.case_name);
            }
        }
    }
    Ok(())
}

async fn holds(ctx: &Invocation, cmd: HoldCommand) -> Result<()> {
    let (session, client) = ctx.authenticated()?;
    let org_id = session.require_org()?;

    match cmd {
        HoldCommand::List => {
            let holds = client.list_holds(org_id).await?;
            if ctx.print_json(&holds)? {
                return Ok(());
            }
            for hold in &holds {
                let status = if hold.active { "ACTIVE" } else { "RELEASED" };
                println!(
                    "{:<38} {:<9} {:>5} items  {}  [{}]",
                    hold.id,
                    status,
                    hold.item_count,
                    hold.name,
                    hold.criteria_summary()
                );
            }
        }
        HoldCommand::Create {
            name,
            reason,
            from,
            to,
            subject,
        } => {
            let hold = NewHold {
                filter_criteria: hold_criteria(
                    from.as_deref().unwrap_or(""),
                    to.as_deref().unwrap_or(""),
                    subject.as_deref().unwrap_or(""),
                ),
                name,
                reason,
            };
            let created = client.create_hold(org_id, &hold).await?;
            println!(
                "🔒 Created hold {} ({}), {} messages held automatically",
                hold.name, created.id, created.auto_held_count
            );
        }
        HoldCommand::Show { id } => {
            let detail = client.get_hold(org_id, &id).await?;
            if ctx.print_json(&detail)? {
                return Ok(());
            }
            println!("🔒 {} [{}]", detail.hold.name, detail.hold.criteria_summary());
            for item in &detail.items {
                println!(
                    "{:<36} {:<28} {}",
                    item.message_id,
                    item.from.as_deref().unwrap_or(""),
                    item.subject.as_deref().unwrap_or("")
                );
            }
        }
        HoldCommand::Release { id } => {
            if !ctx.confirm(&format!("Release hold {}? Held messages become deletable again.", id))? {
                println!("Cancelled");
                return Ok(());
            }
            client.release_hold(org_id, &id).await?;
            println!("🔓 Released hold {}", id);
        }
        HoldCommand::Apply { hold, message_ids } => match hold {
            Some(hold_id) => {
                client.apply_hold(org_id, &hold_id, &message_ids).await?;
                if let Some(trail) = AuditTrail::for_session(&client, &session) {
                    trail
                        .record(
                            AuditAction::ApplyLegalHold,
                            serde_json::json!({ "hold_id": hold_id, "count": message_ids.len() }),
                        )
                        .await;
                }
                println!("🔒 {} messages placed on hold {}", message_ids.len(), hold_id);
            }
            None => {
                let mut selection = Selection::new();
                for id in message_ids {
                    selection.toggle(id);
                }
                let flows = Workflows::new(&client, &session);
                if let Some(applied) = flows.apply_hold(&mut selection, Utc::now().date_naive()).await? {
                    let note = if applied.created { " (new hold)" } else { "" };
                    println!("🔒 {} messages placed on hold {}{}", applied.count, applied.hold_id, note);
                }
            }
        },
    }
    Ok(())
}

async fn audit(ctx: &Invocation, cmd: AuditCommand) -> Result<()> {
    let (session, client) = ctx.authenticated()?;
    let org_id = session.require_org()?;

    match cmd {
        AuditCommand::List { limit } => {
            let entries = client
                .list_audit_logs(org_id, limit.unwrap_or(ctx.config.audit_log_limit))
                .await?;
            if ctx.print_json(&entries)? {
                return Ok(());
            }
            for entry in &entries {
                println!("{:<26} {:<20} {:<18} {}", entry.timestamp, entry.username, entry.action, entry.details);
            }
        }
        AuditCommand::Append { action, details } => {
            let details = serde_json::from_str(&details).context("--details must be valid JSON")?;
            let entry = AuditLogCreate {
                username: session.audit_username(),
                action,
                details,
            };
            let receipt = client.append_audit_log(org_id, &entry).await?;
            println!("📝 Recorded {} (hash {})", entry.action, receipt.hash.unwrap_or_default());
        }
        AuditCommand::Verify => {
            let verdict = client.verify_audit_chain(org_id).await?;
            if ctx.print_json(&verdict)? {
                return Ok(());
            }
            if verdict.valid {
                println!(
                    "✅ Audit chain intact ({} entries)",
                    verdict.log_count.map(|c| c.to_string()).unwrap_or_else(|| "?".into())
                );
            } else {
                bail!(
                    "Audit chain broken: {}",
                    verdict.error.unwrap_or_else(|| "verification failed".to_string())
                );
            }
        }
    }
    Ok(())
}

fn scope(session: &Session) -> Option<i64> {
    match session.role() {
        Role::SuperAdmin => None,
        _ => session.org_id(),
    }
}

async fn users(ctx: &Invocation, cmd: UserCommand) -> Result<()> {
    let (session, client) = ctx.authenticated()?;

    match cmd {
        UserCommand::List => {
            let users = client.list_users(scope(&session)).await?;
            if ctx.print_json(&users)? {
                return Ok(());
            }
            for user in &users {
                println!(
                    "{:>5}  {:<30} {:<13} {:>4}  {}",
                    user.id,
                    user.username,
                    user.role,
                    user.org_id.map(|id| id.to_string()).unwrap_or_default(),
                    user.domains.join(", ")
                );
            }
        }
        UserCommand::Create {
            username,
            password,
            domains,
            org,
        } => {
            let password = match password {
                Some(password) => password,
                None => read_line("Password for the new user: ")?,
            };
            let draft = UserDraft {
                username,
                password,
                domains,
                target_org: org,
            };
            let user = Workflows::new(&client, &session).create_user(draft).await?;
            println!("✅ Created {} {} (id {})", user.role, user.username, user.id);
        }
        UserCommand::Delete { id } => {
            if !ctx.confirm(&format!("Delete user {}?", id))? {
                println!("Cancelled");
                return Ok(());
            }
            client.delete_user(id).await?;
            println!("🗑️  Deleted user {}", id);
        }
    }
    Ok(())
}

async fn orgs(ctx: &Invocation, cmd: OrgCommand) -> Result<()> {
    let (_session, client) = ctx.authenticated()?;

    match cmd {
        OrgCommand::List => {
            let orgs = client.list_organizations().await?;
            if ctx.print_json(&orgs)? {
                return Ok(());
            }
            for org in &orgs {
                println!("{:>5}  {:<30} {:<20} {}", org.id, org.name, org.slug, org.domains.join(", "));
            }
        }
        OrgCommand::Create { name, slug, domains } => {
            let org = NewOrganization {
                slug: slug.unwrap_or_else(|| slugify(&name)),
                name,
                domains: split_list(&domains),
            };
            let created = client.create_organization(&org).await?;
            println!("✅ Created organization {} ({}, id {})", created.name, created.slug, created.id);
        }
        OrgCommand::Delete { id } => {
            if !ctx.confirm(&format!("Delete organization {} and all of its data?", id))? {
                println!("Cancelled");
                return Ok(());
            }
            client.delete_organization(id).await?;
            println!("🗑️  Deleted organization {}", id);
        }
    }
    Ok(())
}

async fn agents(ctx: &Invocation) -> Result<()> {
    let (_session, client) = ctx.authenticated()?;
    let agents = client.list_agents().await?;
    if ctx.print_json(&agents)? {
        return Ok(());
    }
    if agents.is_empty() {
        println!("No agents registered");
    }
    for agent in &agents {
        let icon = if agent.status.eq_ignore_ascii_case("online") { "🟢" } else { "🔴" };
        println!(
            "{} {:<24} {:<20} last seen {}",
            icon,
            agent.name,
            agent.hostname.as_deref().unwrap_or("-"),
            agent.last_seen.as_deref().unwrap_or("never")
        );
    }
    Ok(())
}

async fn analytics(ctx: &Invocation) -> Result<()> {
    let (session, client) = ctx.authenticated()?;
    let analytics = client.org_analytics(session.require_org()?).await?;
    if ctx.print_json(&analytics)? {
        return Ok(());
    }
    println!("📊 Messages:     {}", analytics.total_messages);
    println!("   Active holds: {}", analytics.active_holds);
    println!("   Held items:   {}", analytics.held_items);
    println!("   Volume:       {}", format_bytes(analytics.storage_volume_bytes));
    println!("   Hold ratio:   {:.1}%", analytics.hold_ratio * 100.0);
    Ok(())
}

async fn stats(ctx: &Invocation) -> Result<()> {
    let (session, client) = ctx.authenticated()?;
    let stats = client.admin_stats(scope(&session)).await?;
    if ctx.print_json(&stats)? {
        return Ok(());
    }
    let rows = [
        ("Organizations", stats.total_organizations),
        ("Users", stats.total_users),
        ("Online agents", stats.online_agents),
        ("Archived emails", stats.total_emails),
        ("Active auditors", stats.active_auditors),
        ("Active holds", stats.active_holds),
        ("Open cases", stats.open_cases),
    ];
    println!("📊 Dashboard counters");
    for (label, value) in rows {
        if let Some(value) = value {
            println!("   {:<16} {}", label, value);
        }
    }
    if let Some(storage) = &stats.storage_used {
        println!("   {:<16} {}", "Storage", storage);
    }
    Ok(())
}

async fn retention(ctx: &Invocation, cmd: RetentionCommand) -> Result<()> {
    let (session, client) = ctx.authenticated()?;
    let scope = scope(&session);

    match cmd {
        RetentionCommand::List => {
            let policies = client.list_retention(scope).await?;
            if ctx.print_json(&policies)? {
                return Ok(());
            }
            for policy in &policies {
                let domains = if policy.domains.is_empty() {
                    "all domains".to_string()
                } else {
                    policy.domains.join(", ")
                };
                println!(
                    "{:>5}  {:<30} {:>5} days  {:<17} {}",
                    policy.id, policy.name, policy.retention_days, policy.action, domains
                );
            }
        }
        RetentionCommand::Create { name, days, domains } => {
            if days <= 0 {
                bail!("--days must be positive");
            }
            let policy = NewRetentionPolicy {
                name,
                domains: split_list(&domains),
                retention_days: days,
                ..NewRetentionPolicy::default()
            };
            client.create_retention(scope, &policy).await?;
            println!("✅ Created retention policy {} ({} days)", policy.name, policy.retention_days);
        }
        RetentionCommand::Delete { id } => {
            if !ctx.confirm(&format!("Delete retention policy {}?", id))? {
                println!("Cancelled");
                return Ok(());
            }
            client.delete_retention(scope, id).await?;
            println!("🗑️  Deleted retention policy {}", id);
        }
        RetentionCommand::Run => {
            if !ctx.confirm("Run retention now? Expired messages not on hold are permanently deleted.")? {
                println!("Cancelled");
                return Ok(());
            }
            let receipt = client.run_retention().await?;
            println!(
                "♻️  Retention {}{}",
                receipt.status.unwrap_or_else(|| "started".to_string()),
                receipt.count.map(|c| format!(", {} messages removed", c)).unwrap_or_default()
            );
        }
    }
    Ok(())
}

async fn health(ctx: &Invocation) -> Result<()> {
    let client = ctx.anonymous_client()?;
    let status = client.health().await?;
    println!("💚 {} is {}", client.base_url(), status.status);
    Ok(())
}

async fn dashboard(ctx: &Invocation) -> Result<()> {
    let (session, client) = ctx.authenticated()?;
    info!("Starting dashboard for {}", session.user.username);
    let api: Arc<dyn ArchiveApi> = Arc::new(client);
    ui::run_app(&ctx.config, session, api).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::User;
    use crate::search::Direction;

    fn session(role: Role, org_id: Option<i64>) -> Session {
        Session {
            access_token: Some("t".into()),
            user: User {
                id: 3,
                username: "ann@corp.com".into(),
                role,
                org_id,
                domains: vec!["corp.com".into()],
            },
        }
    }

    #[test]
    fn test_search_request_from_args() {
        let args = SearchArgs {
            query: "invoice".into(),
            from: Some("cfo@corp.com".into()),
            direction: Some(Direction::Received),
            page: 3,
            limit: Some(10),
            ..SearchArgs::default()
        };
        let request = search_request(&session(Role::Auditor, Some(4)), &args, 20).unwrap();
        assert_eq!(request.org_id, 4);
        assert_eq!(request.limit, 10);
        assert_eq!(request.offset, 20);
        assert_eq!(request.filters.from, "cfo@corp.com");
        assert_eq!(request.filters.direction, Some(Direction::Received));
    }

    #[test]
    fn test_search_request_needs_org() {
        let args = SearchArgs::default();
        assert!(search_request(&session(Role::Auditor, None), &args, 20).is_err());
    }

    #[test]
    fn test_scope_by_role() {
        assert_eq!(scope(&session(Role::SuperAdmin, Some(1))), None);
        assert_eq!(scope(&session(Role::ClientAdmin, Some(4))), Some(4));
    }
}
