//! Static descriptions of the store-scoped resources.
//!
//! A descriptor is everything the generic handler and the generic queries
//! need to know about a resource: where it lives, which fields a write must
//! carry, which other records those fields point at, and which records point
//! back at it. Table and column names only ever come from these constants.

/// A required string field of a resource.
#[derive(Debug)]
pub struct FieldSpec {
    /// Key in request and response JSON.
    pub key: &'static str,
    /// Column in the resource table.
    pub column: &'static str,
    /// Human name used in validation messages.
    pub label: &'static str,
}

/// A field whose value must be the id of another resource in the same store.
#[derive(Debug)]
pub struct Reference {
    pub key: &'static str,
    pub target: &'static ResourceDescriptor,
}

/// Records elsewhere that hold this resource's id and block its deletion.
#[derive(Debug)]
pub struct Dependent {
    pub table: &'static str,
    pub column: &'static str,
    /// Plural display name, e.g. "categories".
    pub display: &'static str,
}

#[derive(Debug)]
pub struct ResourceDescriptor {
    /// Short name used in logs, e.g. "billboard".
    pub name: &'static str,
    /// Display name used in messages, e.g. "Billboard".
    pub display: &'static str,
    /// URL segment under `/api/stores/{store_id}/`.
    pub path: &'static str,
    pub table: &'static str,
    /// Required fields, in validation order.
    pub fields: &'static [FieldSpec],
    pub references: &'static [Reference],
    pub dependents: &'static [Dependent],
}

impl ResourceDescriptor {
    pub fn field(&self, key: &str) -> Option<&FieldSpec> {
        self.fields.iter().find(|f| f.key == key)
    }

    pub fn columns(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.fields.iter().map(|f| f.column)
    }
}

pub static BILLBOARDS: ResourceDescriptor = ResourceDescriptor {
    name: "billboard",
    display: "Billboard",
    path: "billboards",
    table: "billboards",
    fields: &[
        FieldSpec {
            key: "label",
            column: "label",
            label: "Billboard label",
        },
        FieldSpec {
            key: "imageUrl",
            column: "image_url",
            label: "Billboard image url",
        },
    ],
    references: &[],
    dependents: &[Dependent {
        table: "categories",
        column: "billboard_id",
        display: "categories",
    }],
};

pub static CATEGORIES: ResourceDescriptor = ResourceDescriptor {
    name: "category",
    display: "Category",
    path: "categories",
    table: "categories",
    fields: &[
        FieldSpec {
            key: "name",
            column: "name",
            label: "Category name",
        },
        FieldSpec {
            key: "billboardId",
            column: "billboard_id",
            label: "Billboard id",
        },
    ],
    references: &[Reference {
        key: "billboardId",
        target: &BILLBOARDS,
    }],
    dependents: &[],
};
