//! OPC Package implementation
//!
//! Handles reading and writing DOCX, XLSX and PPTX files as ZIP packages.
//! Parts are kept in URI order so saving the same package twice produces the
//! same archive layout.

use crate::error::{Error, Result};
use crate::opc::relationships::rel_types;
use crate::opc::{ContentTypes, Part, PartUri, Relationships};
use crate::xml::RawXmlElement;
use std::collections::BTreeMap;
use std::fs::File;
use std::io::{BufReader, BufWriter, Cursor, Read, Seek, Write};
use std::path::Path;
use zip::read::ZipArchive;
use zip::write::{SimpleFileOptions, ZipWriter};
use zip::CompressionMethod;

/// An OPC package (ZIP-based container for DOCX, XLSX, PPTX)
#[derive(Debug)]
pub struct Package {
    parts: BTreeMap<PartUri, Part>,
    /// Package-level relationships (/_rels/.rels)
    relationships: Relationships,
    /// Content types ([Content_Types].xml)
    content_types: ContentTypes,
}

impl Package {
    /// Create a new empty package
    pub fn new() -> Self {
        Self {
            parts: BTreeMap::new(),
            relationships: Relationships::new(),
            content_types: ContentTypes::new(),
        }
    }

    /// Open a package from a file path
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let file = File::open(path)?;
        Self::from_reader(BufReader::new(file))
    }

    /// Open a package from bytes
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        Self::from_reader(Cursor::new(bytes))
    }

    /// Open a package from a reader
    pub fn from_reader<R: Read + Seek>(reader: R) -> Result<Self> {
        let mut archive = ZipArchive::new(reader)?;
        let mut package = Self::new();

        // Step 1: [Content_Types].xml
        package.content_types = Self::read_content_types(&mut archive)?;

        // Step 2: package relationships (/_rels/.rels)
        package.relationships = Self::read_package_rels(&mut archive)?;

        // Step 3: all parts
        package.read_parts(&mut archive)?;

        // Step 4: part relationships
        package.read_part_relationships(&mut archive)?;

        log::debug!("opened package with {} parts", package.parts.len());
        Ok(package)
    }

    /// Save the package to a file
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let file = File::create(path)?;
        let mut writer = BufWriter::new(file);
        self.write_to(&mut writer)?;
        writer.flush()?;
        Ok(())
    }

    /// Save the package to bytes
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        let mut cursor = Cursor::new(Vec::new());
        self.write_to(&mut cursor)?;
        Ok(cursor.into_inner())
    }

    /// Write the package to a writer
    pub fn write_to<W: Write + Seek>(&self, writer: W) -> Result<()> {
        let mut zip = ZipWriter::new(writer);
        let options = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);

        zip.start_file("[Content_Types].xml", options)?;
        self.content_types.write_to(&mut zip)?;

        if !self.relationships.is_empty() {
            zip.start_file("_rels/.rels", options)?;
            self.relationships.write_to(&mut zip)?;
        }

        for (uri, part) in &self.parts {
            zip.start_file(uri.zip_name(), options)?;
            zip.write_all(part.data())?;

            if let Some(rels) = part.relationships_to_write() {
                zip.start_file(uri.relationships_uri().zip_name(), options)?;
                rels.write_to(&mut zip)?;
            }
        }

        zip.finish()?;
        Ok(())
    }

    /// Get a part by URI
    pub fn part(&self, uri: &PartUri) -> Option<&Part> {
        self.parts.get(uri)
    }

    /// Get a mutable part by URI
    pub fn part_mut(&mut self, uri: &PartUri) -> Option<&mut Part> {
        self.parts.get_mut(uri)
    }

    /// Whether a part exists
    pub fn contains(&self, uri: &PartUri) -> bool {
        self.parts.contains_key(uri)
    }

    /// Add an XML part, registering its content type as an override
    pub fn add_part(&mut self, part: Part) {
        let uri = part.uri().clone();
        self.content_types.add_override(&uri, part.content_type());
        self.parts.insert(uri, part);
    }

    /// Add a binary part whose content type is covered by an extension default
    pub fn add_media_part(&mut self, part: Part) {
        if let Some(ext) = part.uri().extension() {
            if !self.content_types.has_default(ext) {
                self.content_types.add_default(ext, part.content_type());
            }
        }
        self.parts.insert(part.uri().clone(), part);
    }

    /// Remove a part (and its relationships) from the package
    pub fn remove_part(&mut self, uri: &PartUri) -> Option<Part> {
        self.content_types.remove_override(uri);
        self.parts.remove(uri)
    }

    /// Get all part URIs
    pub fn part_uris(&self) -> impl Iterator<Item = &PartUri> {
        self.parts.keys()
    }

    /// Get package-level relationships
    pub fn relationships(&self) -> &Relationships {
        &self.relationships
    }

    /// Get mutable package-level relationships
    pub fn relationships_mut(&mut self) -> &mut Relationships {
        &mut self.relationships
    }

    /// Get content types
    pub fn content_types(&self) -> &ContentTypes {
        &self.content_types
    }

    /// URI of the main document part (document.xml, workbook.xml, presentation.xml)
    pub fn main_part_uri(&self) -> Result<PartUri> {
        let rel = self
            .relationships
            .by_type(rel_types::OFFICE_DOCUMENT)
            .ok_or_else(|| Error::MissingPart("officeDocument relationship".into()))?;
        let uri = PartUri::new(&rel.target)?;
        if !self.parts.contains_key(&uri) {
            return Err(Error::MissingPart(uri.to_string()));
        }
        Ok(uri)
    }

    /// Relationships owned by a part
    pub fn part_relationships(&self, uri: &PartUri) -> Option<&Relationships> {
        self.parts.get(uri)?.relationships()
    }

    /// Resolve the part a relationship of `source` points at
    pub fn related_uri(&self, source: &PartUri, rel_id: &str) -> Result<PartUri> {
        let rel = self
            .part_relationships(source)
            .and_then(|rels| rels.get(rel_id))
            .ok_or_else(|| Error::InvalidRelationship(format!("{rel_id} on {source}")))?;
        source.resolve(&rel.target)
    }

    /// First part related to `source` by the given relationship type
    pub fn related_by_type(&self, source: &PartUri, rel_type: &str) -> Option<PartUri> {
        let rel = self.part_relationships(source)?.by_type(rel_type)?;
        source.resolve(&rel.target).ok()
    }

    /// Add a relationship from `source` to `target`, returning its id
    pub fn relate(&mut self, source: &PartUri, rel_type: &str, target: &PartUri) -> Result<String> {
        let relative = source.relative_target(target);
        let part = self
            .parts
            .get_mut(source)
            .ok_or_else(|| Error::PartNotFound(source.to_string()))?;
        Ok(part.relate(rel_type, &relative))
    }

    /// Drop the relationship `rel_id` owned by `source`
    pub fn unrelate(&mut self, source: &PartUri, rel_id: &str) {
        if let Some(part) = self.parts.get_mut(source) {
            part.unrelate(rel_id);
        }
    }

    /// First unused URI of the form `{stem}{n}.{ext}`, n starting at 1
    pub fn next_part_uri(&self, stem: &str, ext: &str) -> Result<PartUri> {
        let mut n = 1;
        loop {
            let uri = PartUri::new(&format!("{stem}{n}.{ext}"))?;
            if !self.parts.contains_key(&uri) {
                return Ok(uri);
            }
            n += 1;
        }
    }

    /// Parse an XML part into a raw element tree
    pub fn read_xml(&self, uri: &PartUri) -> Result<RawXmlElement> {
        let part = self
            .parts
            .get(uri)
            .ok_or_else(|| Error::PartNotFound(uri.to_string()))?;
        part.xml()
    }

    /// Serialize a raw element tree into an existing part
    pub fn write_xml(&mut self, uri: &PartUri, root: &RawXmlElement) -> Result<()> {
        self.parts
            .get_mut(uri)
            .ok_or_else(|| Error::PartNotFound(uri.to_string()))?
            .set_xml(root)
    }

    // === Private methods ===

    fn read_content_types<R: Read + Seek>(archive: &mut ZipArchive<R>) -> Result<ContentTypes> {
        let mut file = archive
            .by_name("[Content_Types].xml")
            .map_err(|_| Error::MissingPart("[Content_Types].xml".into()))?;

        let mut content = String::new();
        file.read_to_string(&mut content)?;

        ContentTypes::from_xml(&content)
    }

    fn read_package_rels<R: Read + Seek>(archive: &mut ZipArchive<R>) -> Result<Relationships> {
        match archive.by_name("_rels/.rels") {
            Ok(mut file) => {
                let mut content = String::new();
                file.read_to_string(&mut content)?;
                Relationships::from_xml(&content)
            }
            Err(_) => Ok(Relationships::new()),
        }
    }

    fn read_parts<R: Read + Seek>(&mut self, archive: &mut ZipArchive<R>) -> Result<()> {
        for i in 0..archive.len() {
            let mut file = archive.by_index(i)?;
            let name = file.name().to_string();

            if name.ends_with('/') || name == "[Content_Types].xml" {
                continue;
            }
            // Relationship files are attached to their source part below
            if name.contains("_rels/") && name.ends_with(".rels") {
                continue;
            }

            let uri = PartUri::new(&name)?;
            let content_type = self
                .content_types
                .get(&uri)
                .unwrap_or("application/octet-stream")
                .to_string();

            let mut data = Vec::new();
            file.read_to_end(&mut data)?;

            self.parts.insert(uri.clone(), Part::new(uri, content_type, data));
        }

        Ok(())
    }

    fn read_part_relationships<R: Read + Seek>(
        &mut self,
        archive: &mut ZipArchive<R>,
    ) -> Result<()> {
        for (uri, part) in self.parts.iter_mut() {
            let rels_uri = uri.relationships_uri();

            if let Ok(mut file) = archive.by_name(rels_uri.zip_name()) {
                let mut content = String::new();
                file.read_to_string(&mut content)?;
                part.attach_relationships(Relationships::from_xml(&content)?);
            }
        }

        Ok(())
    }
}

impl Default for Package {
    fn default() -> Self {
        Self::new()
    }
}
