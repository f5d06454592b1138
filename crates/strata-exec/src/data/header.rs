//! Header representation.
//!
//! A header describes the fields of a view: the owning view (table alias),
//! the column name and the column's position in that view. Name lookups are
//! ASCII case-insensitive.

use std::fmt;

use strata_common::{StrataError, StrataResult};

/// Column name of the internal row-id field.
pub const INTERNAL_ID_COLUMN: &str = "__@INTERNAL_ID@__";

/// A reference to a field, as written in an expression.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum FieldRef {
    /// Reference by column name, optionally qualified by a view alias.
    Name {
        /// View qualifier.
        view: Option<String>,
        /// Column name.
        column: String,
    },
    /// Reference by 1-based column position within a view.
    Number {
        /// View qualifier.
        view: String,
        /// Column position, starting at 1.
        number: usize,
    },
}

impl FieldRef {
    /// Creates an unqualified column reference.
    pub fn column(column: impl Into<String>) -> Self {
        FieldRef::Name {
            view: None,
            column: column.into(),
        }
    }

    /// Creates a qualified column reference.
    pub fn qualified(view: impl Into<String>, column: impl Into<String>) -> Self {
        FieldRef::Name {
            view: Some(view.into()),
            column: column.into(),
        }
    }

    /// Creates a column-number reference.
    pub fn number(view: impl Into<String>, number: usize) -> Self {
        FieldRef::Number {
            view: view.into(),
            number,
        }
    }
}

impl fmt::Display for FieldRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldRef::Name {
                view: Some(view),
                column,
            } => write!(f, "{}.{}", view, column),
            FieldRef::Name { view: None, column } => write!(f, "{}", column),
            FieldRef::Number { view, number } => write!(f, "{}.{}", view, number),
        }
    }
}

/// One field descriptor of a header.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HeaderField {
    /// Owning view or alias. Empty for derived columns.
    pub view: String,
    /// Column name.
    pub column: String,
    /// 1-based position of the column in its view, 0 if not applicable.
    pub number: usize,
    /// Marks the internal row-id field.
    pub is_internal_id: bool,
    /// Marks a key column collapsed by a USING or NATURAL join.
    pub is_join_column: bool,
    /// View a collapsed join column was taken from. Qualified references
    /// through this alias still resolve to the collapsed column.
    pub origin_view: String,
}

impl HeaderField {
    /// Creates a regular field.
    pub fn new(view: impl Into<String>, column: impl Into<String>, number: usize) -> Self {
        Self {
            view: view.into(),
            column: column.into(),
            number,
            is_internal_id: false,
            is_join_column: false,
            origin_view: String::new(),
        }
    }

    /// Creates the internal row-id field for a view.
    pub fn internal_id(view: impl Into<String>) -> Self {
        Self {
            view: view.into(),
            column: INTERNAL_ID_COLUMN.to_string(),
            number: 0,
            is_internal_id: true,
            is_join_column: false,
            origin_view: String::new(),
        }
    }

    /// Turns this field into a collapsed join column. The field loses its
    /// view and position, and keeps its view as the origin qualifier.
    pub fn into_join_column(mut self) -> Self {
        if !self.view.is_empty() {
            self.origin_view = std::mem::take(&mut self.view);
        }
        self.number = 0;
        self.is_join_column = true;
        self
    }

    fn matches_name(&self, view: Option<&str>, column: &str) -> bool {
        if self.is_internal_id || !self.column.eq_ignore_ascii_case(column) {
            return false;
        }
        match view {
            Some(view) => {
                self.view.eq_ignore_ascii_case(view)
                    || (self.is_join_column
                        && !self.origin_view.is_empty()
                        && self.origin_view.eq_ignore_ascii_case(view))
            }
            None => true,
        }
    }
}

impl fmt::Display for HeaderField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.view.is_empty() {
            write!(f, "{}", self.column)
        } else {
            write!(f, "{}.{}", self.view, self.column)
        }
    }
}

/// Ordered field descriptors of a view.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Header {
    fields: Vec<HeaderField>,
}

impl Header {
    /// Creates a header for `view` with the given column names.
    pub fn new(view: &str, columns: &[&str]) -> Self {
        let fields = columns
            .iter()
            .enumerate()
            .map(|(i, column)| HeaderField::new(view, *column, i + 1))
            .collect();
        Self { fields }
    }

    /// Creates a header whose first field is the internal row id.
    pub fn with_internal_id(view: &str, columns: &[&str]) -> Self {
        let mut header = Self::new(view, columns);
        header.fields.insert(0, HeaderField::internal_id(view));
        header
    }

    /// Creates a header from field descriptors.
    pub fn from_fields(fields: Vec<HeaderField>) -> Self {
        Self { fields }
    }

    /// Returns the number of fields.
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// Returns true if the header has no fields.
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Returns the fields.
    pub fn fields(&self) -> &[HeaderField] {
        &self.fields
    }

    /// Returns the field at the given index.
    pub fn field(&self, index: usize) -> Option<&HeaderField> {
        self.fields.get(index)
    }

    /// Returns true if the header carries an internal row-id field.
    pub fn contains_internal_id(&self) -> bool {
        self.fields.iter().any(|f| f.is_internal_id)
    }

    /// Concatenates two headers for a join.
    pub fn merge(&self, other: &Header) -> Header {
        let mut fields = Vec::with_capacity(self.len() + other.len());
        fields.extend(self.fields.iter().cloned());
        fields.extend(other.fields.iter().cloned());
        Header { fields }
    }

    /// Resolves a column-name reference.
    ///
    /// Fails with `FieldNotExist` when nothing matches and with
    /// `FieldAmbiguous` when more than one field matches. A key column
    /// collapsed by a USING or NATURAL join shadows other fields of the
    /// same name.
    pub fn search_index(&self, field: &FieldRef) -> StrataResult<usize> {
        let (view, column) = match field {
            FieldRef::Name { view, column } => (view.as_deref(), column.as_str()),
            FieldRef::Number { .. } => return self.field_index(field),
        };

        let mut found: Option<usize> = None;
        let mut ambiguous = false;
        for (i, f) in self.fields.iter().enumerate() {
            if !f.matches_name(view, column) {
                continue;
            }
            match found {
                None => found = Some(i),
                Some(prev) => match (self.fields[prev].is_join_column, f.is_join_column) {
                    (true, false) => {}
                    (false, true) => {
                        found = Some(i);
                        ambiguous = false;
                    }
                    _ => ambiguous = true,
                },
            }
        }

        if ambiguous {
            return Err(StrataError::FieldAmbiguous {
                field: field.to_string(),
            });
        }
        found.ok_or_else(|| StrataError::FieldNotExist {
            field: field.to_string(),
        })
    }

    /// Resolves any field reference, including column numbers.
    pub fn field_index(&self, field: &FieldRef) -> StrataResult<usize> {
        match field {
            FieldRef::Name { .. } => self.search_index(field),
            FieldRef::Number { view, number } => self
                .fields
                .iter()
                .position(|f| {
                    !f.is_internal_id && f.number == *number && f.view.eq_ignore_ascii_case(view)
                })
                .ok_or_else(|| StrataError::FieldNotExist {
                    field: field.to_string(),
                }),
        }
    }
}

impl fmt::Display for Header {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[")?;
        for (i, field) in self.fields.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{}", field)?;
        }
        write!(f, "]")
    }
}
