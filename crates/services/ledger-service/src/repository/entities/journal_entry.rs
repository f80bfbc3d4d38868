//! Journal entry header entity for SeaORM.

use sea_orm::entity::prelude::*;

use common::AppResult;
use domain::{JournalEntry, SourceRef};

use super::{journal_entry_line, parse_label};

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "journal_entries")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    #[sea_orm(unique)]
    pub entry_number: String,
    pub entry_date: Date,
    pub memo: Option<String>,
    pub is_adjusting: bool,
    pub source_type: Option<String>,
    pub source_id: Option<Uuid>,
    pub reversed_entry_id: Option<Uuid>,
    pub created_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::journal_entry_line::Entity")]
    Lines,
}

impl Related<super::journal_entry_line::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Lines.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl Model {
    /// Assemble the domain entry from its header and lines (any order).
    pub fn into_entry(self, mut lines: Vec<journal_entry_line::Model>) -> AppResult<JournalEntry> {
        lines.sort_by_key(|l| l.sort_order);

        let source = match (self.source_type.as_deref(), self.source_id) {
            (Some(kind), Some(id)) => Some(SourceRef::new(parse_label("source type", kind)?, id)),
            _ => None,
        };

        Ok(JournalEntry {
            id: self.id,
            entry_number: self.entry_number,
            entry_date: self.entry_date,
            memo: self.memo,
            is_adjusting: self.is_adjusting,
            source,
            reversed_entry_id: self.reversed_entry_id,
            lines: lines.into_iter().map(Into::into).collect(),
            created_at: self.created_at,
        })
    }
}
