//! In-memory classification tree: blocks, categories and subcategories.
//!
//! The tree is read once from a JSON document shaped like
//! `{"bloques": [{"codigo", "categorias": [{"codigo", "subcategorias": [{"codigo"}]}]}]}` and is
//! immutable afterwards.

use std::{collections::HashMap, fs, io::Read, path::Path};

use serde::{Deserialize, Serialize};

use crate::{Error, Result, level};

/// Separator between codes in [`ClassificationEntry::path`].
pub const PATH_SEPARATOR: &str = " > ";

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ClassificationEntry {
	pub code: String,
	pub description: String,
	/// 1 = block, 2 = category, 3 = subcategory.
	pub level: u32,
	/// Root-to-node chain of codes, e.g. `S50-S59 > S52 > S52.5`.
	pub path: String,
	pub children: Vec<ClassificationEntry>,
}

#[derive(Debug)]
pub struct HierarchyIndex {
	roots: Vec<ClassificationEntry>,
	/// Child positions from the roots down to each code.
	positions: HashMap<String, Vec<usize>>,
}
impl HierarchyIndex {
	pub fn load(path: &Path) -> Result<Self> {
		let file = fs::File::open(path)
			.map_err(|err| Error::ReadHierarchy { path: path.to_path_buf(), source: err })?;
		let index = Self::from_reader(file)?;

		tracing::info!(path = %path.display(), codes = index.len(), "Hierarchy loaded.");

		Ok(index)
	}

	pub fn from_reader<R>(reader: R) -> Result<Self>
	where
		R: Read,
	{
		let document: RawDocument =
			serde_json::from_reader(reader).map_err(|err| Error::ParseHierarchy { source: err })?;

		Self::from_document(document)
	}

	pub fn from_json(raw: &str) -> Result<Self> {
		let document: RawDocument =
			serde_json::from_str(raw).map_err(|err| Error::ParseHierarchy { source: err })?;

		Self::from_document(document)
	}

	/// Entries from the root block down to `code`, or an empty vector when the code is unknown.
	pub fn find_path(&self, code: &str) -> Vec<&ClassificationEntry> {
		let Some(positions) = self.positions.get(code) else {
			return Vec::new();
		};
		let mut path = Vec::with_capacity(positions.len());
		let mut siblings = &self.roots;

		for &pos in positions {
			let entry = &siblings[pos];

			path.push(entry);

			siblings = &entry.children;
		}

		path
	}

	pub fn is_valid(&self, code: &str) -> bool {
		!self.find_path(code).is_empty()
	}

	pub fn get(&self, code: &str) -> Option<&ClassificationEntry> {
		self.find_path(code).pop()
	}

	pub fn roots(&self) -> &[ClassificationEntry] {
		&self.roots
	}

	pub fn len(&self) -> usize {
		self.positions.len()
	}

	pub fn is_empty(&self) -> bool {
		self.positions.is_empty()
	}

	fn from_document(document: RawDocument) -> Result<Self> {
		let mut positions = HashMap::new();
		let mut roots = Vec::with_capacity(document.bloques.len());

		for (block_pos, block) in document.bloques.into_iter().enumerate() {
			let mut block_entry =
				build_entry(block.codigo, block.descripcion, level::BLOCK, None, "bloques")?;

			register(&mut positions, &block_entry.code, vec![block_pos])?;

			for (category_pos, category) in block.categorias.into_iter().enumerate() {
				let mut category_entry = build_entry(
					category.codigo,
					category.descripcion,
					level::CATEGORY,
					Some(block_entry.path.as_str()),
					&block_entry.code,
				)?;

				register(&mut positions, &category_entry.code, vec![block_pos, category_pos])?;

				for (sub_pos, subcategory) in category.subcategorias.into_iter().enumerate() {
					let sub_entry = build_entry(
						subcategory.codigo,
						subcategory.descripcion,
						level::SUBCATEGORY,
						Some(category_entry.path.as_str()),
						&category_entry.code,
					)?;

					register(&mut positions, &sub_entry.code, vec![block_pos, category_pos, sub_pos])?;

					category_entry.children.push(sub_entry);
				}

				block_entry.children.push(category_entry);
			}

			roots.push(block_entry);
		}

		Ok(Self { roots, positions })
	}
}

#[derive(Debug, Deserialize)]
struct RawDocument {
	bloques: Vec<RawBlock>,
}

#[derive(Debug, Deserialize)]
struct RawBlock {
	codigo: String,
	#[serde(default)]
	descripcion: String,
	#[serde(default)]
	categorias: Vec<RawCategory>,
}

#[derive(Debug, Deserialize)]
struct RawCategory {
	codigo: String,
	#[serde(default)]
	descripcion: String,
	#[serde(default)]
	subcategorias: Vec<RawSubcategory>,
}

#[derive(Debug, Deserialize)]
struct RawSubcategory {
	codigo: String,
	#[serde(default)]
	descripcion: String,
}

fn build_entry(
	code: String,
	description: String,
	level: u32,
	parent_path: Option<&str>,
	parent_label: &str,
) -> Result<ClassificationEntry> {
	let code = code.trim().to_string();

	if code.is_empty() {
		return Err(Error::EmptyCode { parent: parent_label.to_string() });
	}

	let path = match parent_path {
		Some(parent) => format!("{parent}{PATH_SEPARATOR}{code}"),
		None => code.clone(),
	};

	Ok(ClassificationEntry {
		code,
		description: description.trim().to_string(),
		level,
		path,
		children: Vec::new(),
	})
}

fn register(
	positions: &mut HashMap<String, Vec<usize>>,
	code: &str,
	position: Vec<usize>,
) -> Result<()> {
	if positions.contains_key(code) {
		return Err(Error::DuplicateCode { code: code.to_string() });
	}

	positions.insert(code.to_string(), position);

	Ok(())
}
