//! Reading skill mentions produced by upstream extraction

use crate::catalog::skill::SkillMention;
use crate::error::{Result, SkillGapError};
use log::{debug, info};
use regex::Regex;
use serde::Deserialize;
use std::path::Path;
use tokio::fs;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MentionFormat {
    /// `[{"raw_text": "Python", "confidence": 0.9}, "SQL"]`
    Json,
    /// One mention per line as `name[: confidence]`, or delimited skill lists
    Text,
}

impl MentionFormat {
    pub fn detect(path: &Path, content: &str) -> Self {
        let is_json_file = path
            .extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| ext.eq_ignore_ascii_case("json"))
            .unwrap_or(false);

        if is_json_file || content.trim_start().starts_with('[') {
            MentionFormat::Json
        } else {
            MentionFormat::Text
        }
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum MentionRow {
    Name(String),
    Full(SkillMention),
}

pub struct MentionReader {
    scored: Regex,
    header: Regex,
    bullet: Regex,
    separators: Regex,
}

impl MentionReader {
    pub fn new() -> Result<Self> {
        let compile = |pattern: &str| {
            Regex::new(pattern).map_err(|e| {
                SkillGapError::InvalidInput(format!("Bad mention pattern '{}': {}", pattern, e))
            })
        };

        Ok(Self {
            scored: compile(r"^(?P<name>.+?)\s*[:=]\s*(?P<confidence>\d*\.?\d+)\s*$")?,
            header: compile(r"(?i)^(skills?|technical skills|technologies|tools|tech stack)\s*:\s*")?,
            bullet: compile(r"^\s*(?:[-*+•]|\d+[.)])\s+")?,
            separators: compile(r"[,;|•]")?,
        })
    }

    pub async fn read_file(&self, path: &Path) -> Result<Vec<SkillMention>> {
        if !path.exists() {
            return Err(SkillGapError::InvalidInput(format!(
                "File does not exist: {}",
                path.display()
            )));
        }

        let content = fs::read_to_string(path).await?;
        let format = MentionFormat::detect(path, &content);
        let mentions = self.parse(&content, format)?;
        info!("Read {} mentions from {}", mentions.len(), path.display());
        Ok(mentions)
    }

    pub fn parse(&self, content: &str, format: MentionFormat) -> Result<Vec<SkillMention>> {
        match format {
            MentionFormat::Json => self.parse_json(content),
            MentionFormat::Text => Ok(self.parse_text(content)),
        }
    }

    pub fn parse_json(&self, content: &str) -> Result<Vec<SkillMention>> {
        let rows: Vec<MentionRow> = serde_json::from_str(content).map_err(|e| {
            SkillGapError::InvalidInput(format!("Mentions must be a JSON array: {}", e))
        })?;

        Ok(rows
            .into_iter()
            .map(|row| match row {
                MentionRow::Name(name) => SkillMention::new(name, 1.0),
                MentionRow::Full(mention) => mention.sanitized(),
            })
            .filter(|m| !m.normalized().is_empty())
            .collect())
    }

    pub fn parse_text(&self, content: &str) -> Vec<SkillMention> {
        let mut mentions = Vec::new();

        for line in content.lines() {
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            let line = self.bullet.replace(line, "");
            let line = self.header.replace(&line, "");

            for piece in self.separators.split(&line) {
                if let Some(mention) = self.parse_piece(piece) {
                    mentions.push(mention);
                }
            }
        }

        debug!("Parsed {} mentions from text", mentions.len());
        mentions
    }

    fn parse_piece(&self, piece: &str) -> Option<SkillMention> {
        let piece = piece.trim();
        if piece.is_empty() {
            return None;
        }

        if let Some(caps) = self.scored.captures(piece) {
            let name = caps["name"].trim();
            if let Ok(confidence) = caps["confidence"].parse::<f32>() {
                if !name.is_empty() {
                    return Some(SkillMention::new(name, confidence));
                }
            }
        }

        Some(SkillMention::new(piece, 1.0))
    }
}
