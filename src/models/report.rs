use serde::Deserialize;

#[derive(Debug, Clone, Copy, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ReportType {
    General,
    Orphanages,
    Children,
    Nutrition,
    Provinces,
}

impl ReportType {
    pub fn title(&self) -> &'static str {
        match self {
            ReportType::General => "Rapport général",
            ReportType::Orphanages => "Rapport des centres d'accueil",
            ReportType::Children => "Rapport des enfants",
            ReportType::Nutrition => "Rapport nutritionnel",
            ReportType::Provinces => "Rapport par province",
        }
    }

    pub fn slug(&self) -> &'static str {
        match self {
            ReportType::General => "general",
            ReportType::Orphanages => "orphanages",
            ReportType::Children => "children",
            ReportType::Nutrition => "nutrition",
            ReportType::Provinces => "provinces",
        }
    }
}

impl std::str::FromStr for ReportType {
    type Err = anyhow::Error;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "general" => Ok(ReportType::General),
            "orphanages" => Ok(ReportType::Orphanages),
            "children" => Ok(ReportType::Children),
            "nutrition" => Ok(ReportType::Nutrition),
            "provinces" => Ok(ReportType::Provinces),
            _ => Err(anyhow::anyhow!("Unknown report type: {s}")),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ReportFormat {
    #[default]
    Text,
    Csv,
}

impl std::str::FromStr for ReportFormat {
    type Err = anyhow::Error;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "text" | "txt" => Ok(ReportFormat::Text),
            "csv" => Ok(ReportFormat::Csv),
            _ => Err(anyhow::anyhow!("Unknown report format: {s}")),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct ReportQuery {
    #[serde(default)]
    pub format: ReportFormat,
}

/// One table of a report, already formatted as text cells.
#[derive(Debug, Clone, PartialEq)]
pub struct ReportSection {
    pub heading: String,
    pub columns: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ReportDocument {
    pub title: String,
    pub generated_on: String,
    pub sections: Vec<ReportSection>,
}
