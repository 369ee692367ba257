use crate::access::value::DataType;

/// One field of a schema: an optional name and a type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldDef {
    pub name: Option<String>,
    pub dtype: DataType,
}

/// The schema of a table: an ordered list of typed, optionally named
/// fields. All fields are fixed-width, so the serialized size of any tuple
/// conforming to this schema is the same.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TupleDesc {
    fields: Vec<FieldDef>,
}

impl TupleDesc {
    pub fn new(fields: Vec<FieldDef>) -> Self {
        Self { fields }
    }

    /// Builds a schema from parallel type and name lists.
    pub fn with_names(types: &[DataType], names: &[&str]) -> Self {
        let fields = types
            .iter()
            .zip(names.iter())
            .map(|(dtype, name)| FieldDef {
                name: Some((*name).to_string()),
                dtype: *dtype,
            })
            .collect();
        Self { fields }
    }

    /// Builds a schema of unnamed fields.
    pub fn from_types(types: &[DataType]) -> Self {
        let fields = types
            .iter()
            .map(|dtype| FieldDef {
                name: None,
                dtype: *dtype,
            })
            .collect();
        Self { fields }
    }

    pub fn num_fields(&self) -> usize {
        self.fields.len()
    }

    pub fn field_type(&self, i: usize) -> DataType {
        self.fields[i].dtype
    }

    pub fn field_name(&self, i: usize) -> Option<&str> {
        self.fields[i].name.as_deref()
    }

    /// Index of the field named `name`, if present.
    pub fn field_index(&self, name: &str) -> Option<usize> {
        self.fields
            .iter()
            .position(|f| f.name.as_deref() == Some(name))
    }

    pub fn types(&self) -> impl Iterator<Item = DataType> + '_ {
        self.fields.iter().map(|f| f.dtype)
    }

    /// Serialized width of one tuple under this schema, in bytes.
    pub fn tuple_size(&self) -> usize {
        self.fields.iter().map(|f| f.dtype.width()).sum()
    }
}
