//! Crafted PE images and assembly metadata for unit tests.
//!
//! Produces the smallest images goblin accepts: one `.text` section holding the CLI header,
//! method bodies, the metadata and optionally a debug directory with a CodeView record.

use crate::{
    metadata::{root::Root, streams::StringsBuilder, tables::TableId},
    utils::align_to_4,
};

/// Builds the metadata of a test assembly: `Module`, `TypeDef`, `MethodDef` and `NestedClass`
#[derive(Default)]
pub struct MetadataImageBuilder {
    types: Vec<TestType>,
}

struct TestType {
    namespace: String,
    name: String,
    enclosing: Option<u32>,
    methods: Vec<(String, u32)>,
}

impl MetadataImageBuilder {
    pub fn new() -> Self {
        MetadataImageBuilder {
            types: vec![TestType {
                namespace: String::new(),
                name: "<Module>".to_string(),
                enclosing: None,
                methods: Vec::new(),
            }],
        }
    }

    /// Add a top-level type with `(name, rva)` methods; its TypeDef row is `types + 1`
    pub fn type_def(mut self, namespace: &str, name: &str, methods: &[(&str, u32)]) -> Self {
        self.push(namespace, name, None, methods);
        self
    }

    /// Add a type nested in the TypeDef row `enclosing`
    pub fn nested_type(
        mut self,
        enclosing: u32,
        name: &str,
        methods: &[(&str, u32)],
    ) -> Self {
        self.push("", name, Some(enclosing), methods);
        self
    }

    fn push(&mut self, namespace: &str, name: &str, enclosing: Option<u32>, methods: &[(&str, u32)]) {
        self.types.push(TestType {
            namespace: namespace.to_string(),
            name: name.to_string(),
            enclosing,
            methods: methods
                .iter()
                .map(|(name, rva)| ((*name).to_string(), *rva))
                .collect(),
        });
    }

    pub fn build(self) -> Vec<u8> {
        let mut strings = StringsBuilder::new();
        let module_name = strings.add("Test.dll").unwrap();

        let method_count: usize = self.types.iter().map(|t| t.methods.len()).sum();
        let nested: Vec<(u32, u32)> = self
            .types
            .iter()
            .enumerate()
            .filter_map(|(index, t)| t.enclosing.map(|outer| (index as u32 + 1, outer)))
            .collect();

        let mut valid = TableId::Module.mask() | TableId::TypeDef.mask();
        let mut row_counts = vec![1u32, self.types.len() as u32];
        if method_count > 0 {
            valid |= TableId::MethodDef.mask();
            row_counts.push(method_count as u32);
        }
        if !nested.is_empty() {
            valid |= TableId::NestedClass.mask();
            row_counts.push(nested.len() as u32);
        }

        let mut tables = vec![0, 0, 0, 0, 2, 0, 0, 1];
        tables.extend_from_slice(&valid.to_le_bytes());
        tables.extend_from_slice(&0u64.to_le_bytes());
        for count in &row_counts {
            tables.extend_from_slice(&count.to_le_bytes());
        }

        // Module: generation, name, mvid, encid, encbaseid
        tables.extend_from_slice(&0u16.to_le_bytes());
        tables.extend_from_slice(&(module_name as u16).to_le_bytes());
        tables.extend_from_slice(&[1, 0, 0, 0, 0, 0]);

        let mut method_rows = Vec::new();
        let mut next_method = 1u16;
        for test_type in &self.types {
            let name = strings.add(&test_type.name).unwrap() as u16;
            let namespace = strings.add(&test_type.namespace).unwrap() as u16;
            tables.extend_from_slice(&0x0010_0001u32.to_le_bytes());
            tables.extend_from_slice(&name.to_le_bytes());
            tables.extend_from_slice(&namespace.to_le_bytes());
            tables.extend_from_slice(&0u16.to_le_bytes());
            tables.extend_from_slice(&1u16.to_le_bytes());
            tables.extend_from_slice(&next_method.to_le_bytes());

            for (method_name, rva) in &test_type.methods {
                let method_name = strings.add(method_name).unwrap() as u16;
                method_rows.extend_from_slice(&rva.to_le_bytes());
                method_rows.extend_from_slice(&0u16.to_le_bytes());
                method_rows.extend_from_slice(&0x0086u16.to_le_bytes());
                method_rows.extend_from_slice(&method_name.to_le_bytes());
                method_rows.extend_from_slice(&0u16.to_le_bytes());
                method_rows.extend_from_slice(&1u16.to_le_bytes());
                next_method += 1;
            }
        }
        tables.extend_from_slice(&method_rows);

        for (inner, outer) in &nested {
            tables.extend_from_slice(&(*inner as u16).to_le_bytes());
            tables.extend_from_slice(&(*outer as u16).to_le_bytes());
        }

        let strings = strings.into_bytes();
        let guid = [0x42u8; 16];
        Root::write_with_streams(
            "v4.0.30319",
            &[
                ("#~", &tables),
                ("#Strings", &strings),
                ("#US", &[0, 0, 0, 0]),
                ("#GUID", &guid),
                ("#Blob", &[0, 0, 0, 0]),
            ],
        )
        .unwrap()
    }
}

/// Builds a PE32 image around crafted metadata
pub struct PeImageBuilder {
    bodies: Vec<u8>,
    metadata: Vec<u8>,
    entry_point: u32,
    codeview: Option<(uguid::Guid, u32, String, u32)>,
    with_clr: bool,
}

impl Default for PeImageBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl PeImageBuilder {
    /// RVA of the `.text` section
    pub const TEXT_RVA: u32 = 0x2000;
    /// File offset of the `.text` section
    pub const TEXT_OFFSET: u32 = 0x200;
    /// Method bodies start right after the CLI header
    const BODIES_RVA: u32 = Self::TEXT_RVA + 72;

    pub fn new() -> Self {
        PeImageBuilder {
            bodies: Vec::new(),
            metadata: Vec::new(),
            entry_point: 0,
            codeview: None,
            with_clr: true,
        }
    }

    /// Append a method body, returning its RVA
    pub fn body(&mut self, body: &[u8]) -> u32 {
        let rva = Self::BODIES_RVA + self.bodies.len() as u32;
        self.bodies.extend_from_slice(body);
        self.bodies.resize(align_to_4(self.bodies.len()), 0);
        rva
    }

    pub fn metadata(mut self, metadata: Vec<u8>) -> Self {
        self.metadata = metadata;
        self
    }

    pub fn entry_point(mut self, token: u32) -> Self {
        self.entry_point = token;
        self
    }

    pub fn codeview(mut self, guid: uguid::Guid, age: u32, path: &str, stamp: u32) -> Self {
        self.codeview = Some((guid, age, path.to_string(), stamp));
        self
    }

    pub fn without_clr(mut self) -> Self {
        self.with_clr = false;
        self
    }

    pub fn build(self) -> Vec<u8> {
        let metadata_rva = Self::BODIES_RVA + self.bodies.len() as u32;
        let mut text = vec![0u8; 72];
        text.extend_from_slice(&self.bodies);
        text.extend_from_slice(&self.metadata);
        text.resize(align_to_4(text.len()), 0);

        // CLI header
        text[0..4].copy_from_slice(&72u32.to_le_bytes());
        text[4..6].copy_from_slice(&2u16.to_le_bytes());
        text[6..8].copy_from_slice(&5u16.to_le_bytes());
        text[8..12].copy_from_slice(&metadata_rva.to_le_bytes());
        text[12..16].copy_from_slice(&(self.metadata.len() as u32).to_le_bytes());
        text[16..20].copy_from_slice(&1u32.to_le_bytes());
        text[20..24].copy_from_slice(&self.entry_point.to_le_bytes());

        let mut debug_directory = (0u32, 0u32);
        if let Some((guid, age, path, stamp)) = &self.codeview {
            let directory_rva = Self::TEXT_RVA + text.len() as u32;
            let payload_rva = directory_rva + 28;
            let payload_size = 24 + path.len() as u32 + 1;

            text.extend_from_slice(&0u32.to_le_bytes());
            text.extend_from_slice(&stamp.to_le_bytes());
            text.extend_from_slice(&0u16.to_le_bytes());
            text.extend_from_slice(&0u16.to_le_bytes());
            text.extend_from_slice(&2u32.to_le_bytes());
            text.extend_from_slice(&payload_size.to_le_bytes());
            text.extend_from_slice(&payload_rva.to_le_bytes());
            text.extend_from_slice(
                &(payload_rva - Self::TEXT_RVA + Self::TEXT_OFFSET).to_le_bytes(),
            );

            text.extend_from_slice(b"RSDS");
            text.extend_from_slice(&guid.to_bytes());
            text.extend_from_slice(&age.to_le_bytes());
            text.extend_from_slice(path.as_bytes());
            text.push(0);

            debug_directory = (directory_rva, 28);
        }

        let raw_size = (text.len() as u32 + 0x1FF) & !0x1FF;
        text.resize(raw_size as usize, 0);
        let size_of_image = Self::TEXT_RVA + ((raw_size + 0x1FFF) & !0x1FFF);

        let mut image = vec![0u8; Self::TEXT_OFFSET as usize];

        // DOS header
        image[0] = b'M';
        image[1] = b'Z';
        image[0x3C..0x40].copy_from_slice(&0x80u32.to_le_bytes());

        let mut header = Vec::with_capacity(0x180);
        header.extend_from_slice(b"PE\0\0");

        // COFF header
        header.extend_from_slice(&0x014Cu16.to_le_bytes());
        header.extend_from_slice(&1u16.to_le_bytes());
        header.extend_from_slice(&0u32.to_le_bytes());
        header.extend_from_slice(&0u32.to_le_bytes());
        header.extend_from_slice(&0u32.to_le_bytes());
        header.extend_from_slice(&224u16.to_le_bytes());
        header.extend_from_slice(&0x2102u16.to_le_bytes());

        // Optional header, standard fields
        header.extend_from_slice(&0x010Bu16.to_le_bytes());
        header.extend_from_slice(&[8, 0]);
        header.extend_from_slice(&raw_size.to_le_bytes());
        header.extend_from_slice(&0u32.to_le_bytes());
        header.extend_from_slice(&0u32.to_le_bytes());
        header.extend_from_slice(&0u32.to_le_bytes());
        header.extend_from_slice(&Self::TEXT_RVA.to_le_bytes());
        header.extend_from_slice(&0u32.to_le_bytes());

        // Optional header, windows fields
        header.extend_from_slice(&0x0040_0000u32.to_le_bytes());
        header.extend_from_slice(&0x2000u32.to_le_bytes());
        header.extend_from_slice(&0x200u32.to_le_bytes());
        for version in [4u16, 0, 0, 0, 4, 0] {
            header.extend_from_slice(&version.to_le_bytes());
        }
        header.extend_from_slice(&0u32.to_le_bytes());
        header.extend_from_slice(&size_of_image.to_le_bytes());
        header.extend_from_slice(&Self::TEXT_OFFSET.to_le_bytes());
        header.extend_from_slice(&0u32.to_le_bytes());
        header.extend_from_slice(&3u16.to_le_bytes());
        header.extend_from_slice(&0x8540u16.to_le_bytes());
        for reserve in [0x0010_0000u32, 0x1000, 0x0010_0000, 0x1000] {
            header.extend_from_slice(&reserve.to_le_bytes());
        }
        header.extend_from_slice(&0u32.to_le_bytes());
        header.extend_from_slice(&16u32.to_le_bytes());

        // Data directories
        for index in 0..16 {
            let (rva, size) = match index {
                6 => debug_directory,
                14 if self.with_clr => (Self::TEXT_RVA, 72),
                _ => (0, 0),
            };
            header.extend_from_slice(&rva.to_le_bytes());
            header.extend_from_slice(&size.to_le_bytes());
        }

        // Section table
        header.extend_from_slice(b".text\0\0\0");
        header.extend_from_slice(&raw_size.to_le_bytes());
        header.extend_from_slice(&Self::TEXT_RVA.to_le_bytes());
        header.extend_from_slice(&raw_size.to_le_bytes());
        header.extend_from_slice(&Self::TEXT_OFFSET.to_le_bytes());
        header.extend_from_slice(&[0; 12]);
        header.extend_from_slice(&0x6000_0020u32.to_le_bytes());

        image[0x80..0x80 + header.len()].copy_from_slice(&header);
        image.extend_from_slice(&text);
        image
    }
}

/// A tiny-format method body with `code_size` bytes of `nop` followed by `ret`
pub fn tiny_body(code_size: u8) -> Vec<u8> {
    let mut body = vec![(code_size << 2) | 0x2];
    body.resize(usize::from(code_size), 0x00);
    body.push(0x2A);
    body
}

/// A fat-format method body with a locals signature
pub fn fat_body(code_size: u32, local_sig_row: u32) -> Vec<u8> {
    let mut body = vec![0x13, 0x30, 0x08, 0x00];
    body.extend_from_slice(&code_size.to_le_bytes());
    let token = if local_sig_row == 0 {
        0
    } else {
        0x1100_0000 | local_sig_row
    };
    body.extend_from_slice(&token.to_le_bytes());
    body.resize(12 + code_size as usize, 0x00);
    body
}
