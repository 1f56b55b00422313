//! Printable reports: fixed-width text pages or CSV.
//!
//! Builders turn already aggregated data into a `ReportDocument`; renderers
//! lay the document out. Only `ReportService::build` touches the database.

use chrono::NaiveDate;
use sqlx::PgPool;

use crate::models::{
    orphanage::{Orphanage, OrphanageQuery},
    report::{ReportDocument, ReportFormat, ReportSection, ReportType},
    stats::{AreaStats, CountBucket, MonthlyPoint, OverviewStats, PublicStats},
};
use crate::services::{
    metrics::REPORTS_COUNTER,
    orphanages::OrphanageService,
    stats::{capacity_utilization, StatsService},
};

pub const CELL_WIDTH: usize = 35;
pub const PAGE_HEIGHT: usize = 60;
/// Blank line plus the `Page n` line.
const FOOTER_LINES: usize = 2;
const FORM_FEED: char = '\x0c';

// ─── Number formatting ───────────────────────────────────────────────────────

/// `12345` → `12 345`.
pub fn format_count(n: i64) -> String {
    let digits = n.unsigned_abs().to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3 + 1);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(' ');
        }
        out.push(c);
    }
    if n < 0 {
        out.insert(0, '-');
    }
    out
}

/// `1234.56` with one decimal → `1 234,6`.
pub fn format_decimal(value: f64, decimals: usize) -> String {
    let fixed = format!("{:.*}", decimals, value.abs());
    let (int_part, frac_part) = match fixed.split_once('.') {
        Some((i, f)) => (i, Some(f)),
        None => (fixed.as_str(), None),
    };
    let int_value: i64 = int_part.parse().unwrap_or(0);
    let mut out = format_count(int_value);
    if value < 0.0 && fixed.chars().any(|c| c.is_ascii_digit() && c != '0') {
        out.insert(0, '-');
    }
    if let Some(frac) = frac_part {
        out.push(',');
        out.push_str(frac);
    }
    out
}

/// `40.0` → `40,0 %`.
pub fn format_percent(value: f64) -> String {
    format!("{} %", format_decimal(value, 1))
}

fn share(count: i64, total: i64) -> String {
    if total == 0 {
        return format_percent(0.0);
    }
    format_percent(count as f64 / total as f64 * 100.0)
}

fn legal_status_label(status: &str) -> &str {
    match status {
        "pending" => "En attente",
        "verified" => "Vérifié",
        "rejected" => "Rejeté",
        other => other,
    }
}

// ─── Builders ────────────────────────────────────────────────────────────────

fn section(heading: &str, columns: &[&str], rows: Vec<Vec<String>>) -> ReportSection {
    ReportSection {
        heading: heading.to_string(),
        columns: columns.iter().map(|c| c.to_string()).collect(),
        rows,
    }
}

fn bucket_section(heading: &str, buckets: &[CountBucket]) -> ReportSection {
    let total: i64 = buckets.iter().map(|b| b.count).sum();
    let rows = buckets
        .iter()
        .map(|b| vec![b.label.clone(), format_count(b.count), share(b.count, total)])
        .collect();
    section(heading, &["Catégorie", "Effectif", "Part"], rows)
}

fn trend_section(trend: &[MonthlyPoint]) -> ReportSection {
    let rows = trend
        .iter()
        .map(|p| vec![p.month.clone(), format_count(p.new_children), format_count(p.total_children)])
        .collect();
    section("Évolution mensuelle des admissions", &["Mois", "Nouveaux enfants", "Total cumulé"], rows)
}

fn document(report_type: ReportType, today: NaiveDate, sections: Vec<ReportSection>) -> ReportDocument {
    ReportDocument {
        title: report_type.title().to_string(),
        generated_on: today.format("%d/%m/%Y").to_string(),
        sections,
    }
}

pub fn general_report(public: &PublicStats, overview: &OverviewStats, today: NaiveDate) -> ReportDocument {
    let summary = section(
        "Vue d'ensemble",
        &["Indicateur", "Valeur"],
        vec![
            vec!["Centres enregistrés".into(), format_count(public.total_orphanages)],
            vec!["Centres vérifiés".into(), format_count(public.verified_orphanages)],
            vec!["Enfants pris en charge".into(), format_count(public.total_children)],
            vec!["Garçons".into(), format_count(public.total_boys)],
            vec!["Filles".into(), format_count(public.total_girls)],
            vec!["Provinces couvertes".into(), format_count(public.provinces_covered)],
        ],
    );
    document(
        ReportType::General,
        today,
        vec![
            summary,
            bucket_section("Répartition par sexe", &overview.children.gender),
            bucket_section("Tranches d'âge", &overview.children.age_groups),
            bucket_section("Statut nutritionnel", &overview.nutrition.statuses),
            bucket_section("Couverture vaccinale", &overview.vaccination),
        ],
    )
}

pub fn orphanages_report(orphanages: &[Orphanage], today: NaiveDate) -> ReportDocument {
    let rows = orphanages
        .iter()
        .map(|o| {
            let capacity = capacity_utilization(o.child_capacity as i64, o.children_total as i64);
            vec![
                o.name.clone(),
                format!("{} / {}", o.city, o.province),
                legal_status_label(&o.legal_status).to_string(),
                format!("{} / {}", format_count(capacity.current_children), format_count(capacity.capacity)),
                format_percent(capacity.utilization_rate),
            ]
        })
        .collect();
    document(
        ReportType::Orphanages,
        today,
        vec![section(
            "Centres d'accueil",
            &["Centre", "Ville / Province", "Statut", "Enfants / Capacité", "Occupation"],
            rows,
        )],
    )
}

pub fn children_report(overview: &OverviewStats, today: NaiveDate) -> ReportDocument {
    document(
        ReportType::Children,
        today,
        vec![
            bucket_section("Répartition par sexe", &overview.children.gender),
            bucket_section("Tranches d'âge", &overview.children.age_groups),
            bucket_section("Situation familiale", &overview.children.parent_status),
            trend_section(&overview.trend),
        ],
    )
}

pub fn nutrition_report(overview: &OverviewStats, today: NaiveDate) -> ReportDocument {
    let average_bmi = overview
        .nutrition
        .average_bmi
        .map(|bmi| format_decimal(bmi, 1))
        .unwrap_or_else(|| "-".into());
    let summary = section(
        "Synthèse",
        &["Indicateur", "Valeur"],
        vec![
            vec!["Mesures enregistrées".into(), format_count(overview.nutrition.records_count)],
            vec!["IMC moyen (dernière mesure)".into(), average_bmi],
        ],
    );
    document(
        ReportType::Nutrition,
        today,
        vec![summary, bucket_section("Statut nutritionnel", &overview.nutrition.statuses)],
    )
}

pub fn provinces_report(provinces: &[AreaStats], today: NaiveDate) -> ReportDocument {
    let rows = provinces
        .iter()
        .map(|p| {
            vec![
                p.province.clone(),
                format!("{} ({} vérifiés)", format_count(p.orphanage_count), format_count(p.verified_count)),
                format_count(p.children_count),
                format!("{} / {}", format_count(p.boys_count), format_count(p.girls_count)),
            ]
        })
        .collect();
    document(
        ReportType::Provinces,
        today,
        vec![section(
            "Répartition par province",
            &["Province", "Centres", "Enfants", "Garçons / Filles"],
            rows,
        )],
    )
}

// ─── Renderers ───────────────────────────────────────────────────────────────

/// Truncates to leave one separating space, then pads to `CELL_WIDTH`.
fn cell(text: &str) -> String {
    let max = CELL_WIDTH - 1;
    let mut out: String = if text.chars().count() > max {
        let mut t: String = text.chars().take(max - 1).collect();
        t.push('…');
        t
    } else {
        text.to_string()
    };
    let width = out.chars().count();
    out.extend(std::iter::repeat(' ').take(CELL_WIDTH - width));
    out
}

fn table_row(cells: &[String]) -> String {
    cells.iter().map(|c| cell(c)).collect::<String>().trim_end().to_string()
}

struct PageWriter<'a> {
    title: &'a str,
    generated_on: &'a str,
    out: String,
    line_on_page: usize,
    page: usize,
}

impl<'a> PageWriter<'a> {
    fn new(title: &'a str, generated_on: &'a str) -> Self {
        let mut writer = Self {
            title,
            generated_on,
            out: String::new(),
            line_on_page: 0,
            page: 1,
        };
        writer.page_header();
        writer
    }

    fn raw(&mut self, line: &str) {
        self.out.push_str(line);
        self.out.push('\n');
        self.line_on_page += 1;
    }

    fn page_header(&mut self) {
        let title = self.title;
        let header = format!("{title} - généré le {}", self.generated_on);
        self.raw(&header);
        self.raw(&"=".repeat(header.chars().count()));
        self.raw("");
    }

    fn has_room(&self, lines: usize) -> bool {
        self.line_on_page + lines <= PAGE_HEIGHT - FOOTER_LINES
    }

    fn footer(&mut self) {
        self.raw("");
        let page = format!("Page {}", self.page);
        self.raw(&page);
    }

    fn break_page(&mut self) {
        self.footer();
        self.out.push(FORM_FEED);
        self.page += 1;
        self.line_on_page = 0;
        self.page_header();
    }

    /// Writes `line`, starting a new page first when needed; `repeat` is written
    /// at the top of the new page.
    fn line(&mut self, line: &str, repeat: &[String]) {
        if !self.has_room(1) {
            self.break_page();
            for r in repeat {
                self.raw(r);
            }
        }
        self.raw(line);
    }

    fn finish(mut self) -> String {
        self.footer();
        self.out
    }
}

pub fn render_text(doc: &ReportDocument) -> String {
    let mut writer = PageWriter::new(&doc.title, &doc.generated_on);

    for section in &doc.sections {
        let header = table_row(&section.columns);
        let rule = "-".repeat(CELL_WIDTH * section.columns.len().max(1));
        let table_header = vec![header, rule];

        // Heading, underline, column header, rule and at least one row stay together.
        if !writer.has_room(5) {
            writer.break_page();
        }
        writer.raw(&section.heading);
        writer.raw(&"-".repeat(section.heading.chars().count()));
        for line in &table_header {
            writer.raw(line);
        }

        if section.rows.is_empty() {
            writer.line("(aucune donnée)", &table_header);
        }
        for row in &section.rows {
            writer.line(&table_row(row), &table_header);
        }
        writer.line("", &[]);
    }

    writer.finish()
}

pub fn render_csv(doc: &ReportDocument) -> anyhow::Result<String> {
    let mut writer = csv::WriterBuilder::new().flexible(true).from_writer(Vec::new());
    writer.write_record([doc.title.as_str(), doc.generated_on.as_str()])?;
    for section in &doc.sections {
        writer.write_record([section.heading.as_str()])?;
        writer.write_record(&section.columns)?;
        for row in &section.rows {
            writer.write_record(row)?;
        }
    }
    let bytes = writer.into_inner().map_err(|e| anyhow::anyhow!("CSV flush failed: {e}"))?;
    Ok(String::from_utf8(bytes)?)
}

/// A rendered report ready to be served or written to disk.
#[derive(Debug, Clone)]
pub struct RenderedReport {
    pub filename: String,
    pub content_type: &'static str,
    pub body: String,
}

pub fn render(doc: &ReportDocument, report_type: ReportType, format: ReportFormat, today: NaiveDate) -> anyhow::Result<RenderedReport> {
    let stamp = today.format("%Y%m%d");
    let rendered = match format {
        ReportFormat::Text => RenderedReport {
            filename: format!("rapport-{}-{stamp}.txt", report_type.slug()),
            content_type: "text/plain; charset=utf-8",
            body: render_text(doc),
        },
        ReportFormat::Csv => RenderedReport {
            filename: format!("rapport-{}-{stamp}.csv", report_type.slug()),
            content_type: "text/csv; charset=utf-8",
            body: render_csv(doc)?,
        },
    };
    Ok(rendered)
}

pub struct ReportService;

impl ReportService {
    /// Re-fetches and re-aggregates the data behind `report_type`.
    pub async fn build(pool: &PgPool, report_type: ReportType, today: NaiveDate) -> anyhow::Result<ReportDocument> {
        let doc = match report_type {
            ReportType::General => {
                let public = StatsService::public_stats(pool).await?;
                let overview = StatsService::overview(pool, None, today).await?;
                general_report(&public, &overview, today)
            }
            ReportType::Orphanages => {
                let orphanages = OrphanageService::list(pool, &OrphanageQuery::default()).await?;
                orphanages_report(&orphanages, today)
            }
            ReportType::Children => {
                let overview = StatsService::overview(pool, None, today).await?;
                children_report(&overview, today)
            }
            ReportType::Nutrition => {
                let overview = StatsService::overview(pool, None, today).await?;
                nutrition_report(&overview, today)
            }
            ReportType::Provinces => {
                let provinces = StatsService::province_stats(pool).await?;
                provinces_report(&provinces, today)
            }
        };
        Ok(doc)
    }

    pub async fn export(
        pool: &PgPool,
        report_type: ReportType,
        format: ReportFormat,
        today: NaiveDate,
    ) -> anyhow::Result<RenderedReport> {
        let doc = Self::build(pool, report_type, today).await?;
        let rendered = render(&doc, report_type, format, today)?;
        let format_label = match format {
            ReportFormat::Text => "text",
            ReportFormat::Csv => "csv",
        };
        REPORTS_COUNTER
            .with_label_values(&[report_type.slug(), format_label])
            .inc();
        tracing::info!("Report {} exported as {}", report_type.slug(), format_label);
        Ok(rendered)
    }
}
