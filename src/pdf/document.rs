use anyhow::{anyhow, Context, Result};
use lopdf::{dictionary, Dictionary, Document, Object, ObjectId, Stream};
use log::{debug, info, warn};
use std::path::{Path, PathBuf};

use crate::config::SheetGeometry;
use crate::error::LabelError;
use crate::layout::Sheet;
use super::content::ContentBuilder;
use super::fonts::{create_font, StandardFont};
use super::resources::{build_page_resources, resolve_dict};

/// Resource name of the label font. Chosen to stay clear of the names
/// template generators use (F1, TT0, ...).
pub const LABEL_FONT_RESOURCE: &str = "QlF1";

/// Page tree depth limit when walking up for inherited attributes
const MAX_TREE_DEPTH: usize = 64;

/// A background PDF whose first page is reused under every sheet.
pub struct Template {
    pub path: PathBuf,
    doc: Document,
    page_id: ObjectId,
}

impl Template {
    pub fn page_count(&self) -> usize {
        self.doc.get_pages().len()
    }

    /// Width and height of the first page in points.
    pub fn page_size(&self) -> Option<(f64, f64)> {
        let [llx, lly, urx, ury] = media_box(&self.doc, self.page_id)?;
        Some((urx - llx, ury - lly))
    }
}

/// What the label drawings are placed on.
pub enum Background {
    Template(Template),
    Blank,
}

/// Load a template PDF and locate its first page.
pub fn load_template(path: &Path) -> Result<Template, LabelError> {
    if !path.is_file() {
        return Err(LabelError::TemplateNotFound(path.to_path_buf()));
    }

    let doc = Document::load(path).map_err(|source| LabelError::TemplateUnreadable {
        path: path.to_path_buf(),
        source,
    })?;

    let page_id = *doc
        .get_pages()
        .values()
        .next()
        .ok_or_else(|| LabelError::TemplateEmpty(path.to_path_buf()))?;

    Ok(Template {
        path: path.to_path_buf(),
        doc,
        page_id,
    })
}

/// Everything an output page copies from its background.
struct PagePrototype {
    page: Dictionary,
    media_box: [f64; 4],
    resources: Option<Dictionary>,
    /// References to the background's content streams, in drawing order
    contents: Vec<Object>,
}

fn number(object: &Object) -> Option<f64> {
    match object {
        Object::Integer(i) => Some(*i as f64),
        Object::Real(r) => Some(*r as f64),
        _ => None,
    }
}

fn resolve<'a>(doc: &'a Document, object: &'a Object) -> &'a Object {
    match object {
        Object::Reference(id) => doc.get_object(*id).unwrap_or(object),
        _ => object,
    }
}

/// Look up a page attribute, following Parent links for inheritable keys
fn inherited_attribute(doc: &Document, page_id: ObjectId, key: &[u8]) -> Option<Object> {
    let mut current = doc.get_dictionary(page_id).ok()?;
    for _ in 0..MAX_TREE_DEPTH {
        if let Ok(value) = current.get(key) {
            return Some(resolve(doc, value).clone());
        }
        let parent = current.get(b"Parent").ok()?.as_reference().ok()?;
        current = doc.get_dictionary(parent).ok()?;
    }
    None
}

fn media_box(doc: &Document, page_id: ObjectId) -> Option<[f64; 4]> {
    let array = inherited_attribute(doc, page_id, b"MediaBox")?;
    let values: Vec<f64> = array
        .as_array()
        .ok()?
        .iter()
        .filter_map(|v| number(resolve(doc, v)))
        .collect();
    match values.as_slice() {
        [a, b, c, d] => Some([a.min(*c), b.min(*d), a.max(*c), b.max(*d)]),
        _ => None,
    }
}

fn rect(values: [f64; 4]) -> Vec<Object> {
    values.iter().map(|v| Object::from(*v as f32)).collect()
}

fn template_prototype(doc: &Document, page_id: ObjectId) -> Result<PagePrototype> {
    let mut page = doc
        .get_dictionary(page_id)
        .with_context(|| "Template page is not a dictionary")?
        .clone();

    let media_box =
        media_box(doc, page_id).ok_or_else(|| anyhow!("Template page has no usable MediaBox"))?;

    let resources = inherited_attribute(doc, page_id, b"Resources")
        .and_then(|r| resolve_dict(doc, &r));

    let contents = match page.get(b"Contents") {
        Ok(Object::Reference(id)) => match doc.get_object(*id) {
            Ok(Object::Array(streams)) => streams.clone(),
            _ => vec![Object::Reference(*id)],
        },
        Ok(Object::Array(streams)) => streams.clone(),
        _ => Vec::new(),
    };

    for key in [b"CropBox".as_slice(), b"Rotate".as_slice()] {
        if !page.has(key) {
            if let Some(value) = inherited_attribute(doc, page_id, key) {
                page.set(key.to_vec(), value);
            }
        }
    }
    page.remove(b"Contents");
    page.remove(b"Resources");
    page.remove(b"Parent");

    Ok(PagePrototype {
        page,
        media_box,
        resources,
        contents,
    })
}

fn blank_prototype(geometry: &SheetGeometry) -> PagePrototype {
    PagePrototype {
        page: dictionary! { "Type" => "Page" },
        media_box: [
            0.0,
            0.0,
            geometry.page_width.as_points(),
            geometry.page_height.as_points(),
        ],
        resources: None,
        contents: Vec::new(),
    }
}

fn blank_document() -> Document {
    let mut doc = Document::with_version("1.5");
    let pages_id = doc.add_object(dictionary! {
        "Type" => "Pages",
        "Kids" => Vec::<Object>::new(),
        "Count" => 0_i64,
    });
    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    doc.trailer.set("Root", catalog_id);
    doc
}

fn pages_root(doc: &Document) -> Result<ObjectId> {
    let pages = doc
        .catalog()?
        .get(b"Pages")
        .with_context(|| "Failed to get Pages from catalog")?;

    pages.as_reference().with_context(|| "Pages is not a reference")
}

/// Replace the page tree's children with exactly `page_ids`
fn set_page_tree(doc: &mut Document, pages_id: ObjectId, page_ids: &[ObjectId]) -> Result<()> {
    let kids: Vec<Object> = page_ids.iter().map(|id| Object::Reference(*id)).collect();

    let pages = doc
        .get_dictionary_mut(pages_id)
        .with_context(|| "Pages root is not a dictionary")?;
    pages.set("Kids", kids);
    pages.set("Count", page_ids.len() as i64);
    Ok(())
}

/// Create the output PDF with one page per sheet
pub fn create_output_pdf(
    sheets: &[Sheet],
    geometry: &SheetGeometry,
    font: StandardFont,
    background: Background,
) -> Result<Document> {
    let (mut output_doc, prototype) = match background {
        Background::Template(template) => {
            if template.page_count() > 1 {
                info!(
                    "Template {:?} has {} pages; using page 1 for every sheet",
                    template.path,
                    template.page_count()
                );
            }
            if let Some((width, height)) = template.page_size() {
                let expected_w = geometry.page_width.as_points();
                let expected_h = geometry.page_height.as_points();
                if (width - expected_w).abs() > 1.0 || (height - expected_h).abs() > 1.0 {
                    warn!(
                        "Template page is {:.0} × {:.0} pt but the label layout expects {:.0} × {:.0} pt",
                        width, height, expected_w, expected_h
                    );
                }
            }
            let prototype = template_prototype(&template.doc, template.page_id)?;
            (template.doc, prototype)
        }
        Background::Blank => (blank_document(), blank_prototype(geometry)),
    };

    let pages_id = pages_root(&output_doc)?;
    let font_id = create_font(&mut output_doc, font);

    // Background content runs inside q ... Q so its graphics state cannot
    // leak into the overlay.
    let save_state = if prototype.contents.is_empty() {
        None
    } else {
        Some(output_doc.add_object(Stream::new(Dictionary::new(), b"q\n".to_vec())))
    };

    let [origin_x, origin_y, _, _] = prototype.media_box;
    let mut page_ids = Vec::with_capacity(sheets.len());

    for sheet in sheets {
        let mut builder =
            ContentBuilder::new(LABEL_FONT_RESOURCE, font).with_origin(origin_x, origin_y);
        for op in &sheet.ops {
            builder.add_op(op, &mut output_doc)?;
        }

        let mut overlay = Vec::new();
        if save_state.is_some() {
            overlay.extend_from_slice(b"\nQ\n");
        }
        overlay.extend(builder.build_content_bytes());
        let overlay_id = output_doc.add_object(Stream::new(Dictionary::new(), overlay));

        let mut contents = Vec::with_capacity(prototype.contents.len() + 2);
        if let Some(id) = save_state {
            contents.push(Object::Reference(id));
            contents.extend(prototype.contents.iter().cloned());
        }
        contents.push(Object::Reference(overlay_id));

        let resources = build_page_resources(
            &output_doc,
            prototype.resources.as_ref(),
            LABEL_FONT_RESOURCE,
            font_id,
            &builder.xobjects,
        );

        let mut page = prototype.page.clone();
        page.set("Type", "Page");
        page.set("Parent", Object::Reference(pages_id));
        page.set("MediaBox", rect(prototype.media_box));
        page.set("Contents", contents);
        page.set("Resources", Object::Dictionary(resources));

        let page_id = output_doc.add_object(Object::Dictionary(page));
        debug!(
            "Sheet {}: {} labels on page object {:?}",
            sheet.index + 1,
            sheet.labels.len(),
            page_id
        );
        page_ids.push(page_id);
    }

    set_page_tree(&mut output_doc, pages_id, &page_ids)?;

    // Drop template pages that are no longer in the tree
    let pruned = output_doc.prune_objects();
    if !pruned.is_empty() {
        debug!("Pruned {} unused template objects", pruned.len());
    }

    Ok(output_doc)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::labels::LabelRequest;
    use crate::layout::SheetLayout;

    fn sheets_for(count: i64) -> Vec<Sheet> {
        let entries = LabelRequest::new("https://example.com/item/", count)
            .entries()
            .unwrap();
        SheetLayout::new(SheetGeometry::sl655()).paginate(entries)
    }

    fn page_content(doc: &Document, page_id: ObjectId) -> String {
        let page = doc.get_dictionary(page_id).unwrap();
        let mut content = Vec::new();
        for stream_ref in page.get(b"Contents").unwrap().as_array().unwrap() {
            let stream = doc
                .get_object(stream_ref.as_reference().unwrap())
                .unwrap()
                .as_stream()
                .unwrap();
            content.extend_from_slice(&stream.content);
        }
        String::from_utf8_lossy(&content).into_owned()
    }

    /// Two-page template with an inherited MediaBox and shared resources.
    fn template_document() -> Document {
        let mut doc = Document::with_version("1.5");
        let pages_id = doc.new_object_id();
        let font_id = doc.add_object(dictionary! {
            "Type" => "Font",
            "Subtype" => "Type1",
            "BaseFont" => "Times-Roman",
        });
        let resources_id = doc.add_object(dictionary! {
            "Font" => dictionary! { "F1" => font_id },
        });
        let mut kids = Vec::new();
        for text in ["SL655", "BACK"] {
            let content = format!("1 0 0 1 10 10 cm BT /F1 12 Tf 0 0 Td ({}) Tj ET", text);
            let content_id = doc.add_object(Stream::new(Dictionary::new(), content.into_bytes()));
            let page_id = doc.add_object(dictionary! {
                "Type" => "Page",
                "Parent" => pages_id,
                "Contents" => content_id,
                "Resources" => resources_id,
            });
            kids.push(Object::Reference(page_id));
        }
        doc.objects.insert(
            pages_id,
            Object::Dictionary(dictionary! {
                "Type" => "Pages",
                "Kids" => kids,
                "Count" => 2_i64,
                "MediaBox" => vec![Object::Integer(0), Object::Integer(0), Object::Integer(612), Object::Integer(792)],
            }),
        );
        let catalog_id = doc.add_object(dictionary! {
            "Type" => "Catalog",
            "Pages" => pages_id,
        });
        doc.trailer.set("Root", catalog_id);
        doc
    }

    fn template() -> Template {
        let doc = template_document();
        let page_id = *doc.get_pages().values().next().unwrap();
        Template {
            path: PathBuf::from("SL655.pdf"),
            doc,
            page_id,
        }
    }

    #[test]
    fn test_blank_document_has_one_page_per_sheet() {
        let sheets = sheets_for(30);
        let doc = create_output_pdf(
            &sheets,
            &SheetGeometry::sl655(),
            StandardFont::Helvetica,
            Background::Blank,
        )
        .unwrap();

        let pages = doc.get_pages();
        assert_eq!(pages.len(), 2);

        let first = *pages.get(&1).unwrap();
        let content = page_content(&doc, first);
        assert!(content.contains("(ITEM-0001) Tj"));
        assert!(content.contains("(ITEM-0024) Tj"));
        assert!(!content.contains("ITEM-0025"));
        assert!(!content.starts_with("Q"));

        let second = *pages.get(&2).unwrap();
        let content = page_content(&doc, second);
        assert!(content.contains("(ITEM-0025) Tj"));
        assert!(content.contains("(ITEM-0030) Tj"));
        assert_eq!(content.matches(" Do Q ").count(), 6);
    }

    #[test]
    fn test_blank_page_resources() {
        let sheets = sheets_for(3);
        let doc = create_output_pdf(
            &sheets,
            &SheetGeometry::sl655(),
            StandardFont::Courier,
            Background::Blank,
        )
        .unwrap();

        let page_id = *doc.get_pages().values().next().unwrap();
        let page = doc.get_dictionary(page_id).unwrap();
        let resources = page.get(b"Resources").unwrap().as_dict().unwrap();
        let fonts = resources.get(b"Font").unwrap().as_dict().unwrap();
        assert!(fonts.has(LABEL_FONT_RESOURCE.as_bytes()));
        let images = resources.get(b"XObject").unwrap().as_dict().unwrap();
        assert_eq!(images.len(), 3);
    }

    #[test]
    fn test_template_first_page_reused_for_every_sheet() {
        let sheets = sheets_for(50);
        let doc = create_output_pdf(
            &sheets,
            &SheetGeometry::sl655(),
            StandardFont::Helvetica,
            Background::Template(template()),
        )
        .unwrap();

        let pages = doc.get_pages();
        assert_eq!(pages.len(), 3);
        for page_id in pages.values() {
            let content = page_content(&doc, *page_id);
            assert!(content.starts_with("q\n1 0 0 1 10 10 cm"));
            assert!(content.contains("(SL655) Tj"));
            assert!(!content.contains("(BACK) Tj"));
            assert!(content.contains("Q\nq "));

            // Inherited MediaBox is made explicit
            let page = doc.get_dictionary(*page_id).unwrap();
            assert_eq!(page.get(b"MediaBox").unwrap().as_array().unwrap().len(), 4);

            // Template font survives next to the label font
            let resources = page.get(b"Resources").unwrap().as_dict().unwrap();
            let fonts = resources.get(b"Font").unwrap().as_dict().unwrap();
            assert!(fonts.has(b"F1"));
            assert!(fonts.has(LABEL_FONT_RESOURCE.as_bytes()));
        }
    }

    #[test]
    fn test_template_and_blank_place_labels_identically() {
        let sheets = sheets_for(24);
        let geometry = SheetGeometry::sl655();
        let blank =
            create_output_pdf(&sheets, &geometry, StandardFont::Helvetica, Background::Blank)
                .unwrap();
        let templated = create_output_pdf(
            &sheets,
            &geometry,
            StandardFont::Helvetica,
            Background::Template(template()),
        )
        .unwrap();

        let text_ops = |doc: &Document| -> Vec<String> {
            let page_id = *doc.get_pages().values().next().unwrap();
            page_content(doc, page_id)
                .split("q BT")
                .skip(1)
                .map(|op| op.split(" ET").next().unwrap_or_default().to_string())
                .collect()
        };
        assert_eq!(text_ops(&blank), text_ops(&templated));
        assert_eq!(text_ops(&blank).len(), 24);
    }

    #[test]
    fn test_template_page_size() {
        assert_eq!(template().page_size(), Some((612.0, 792.0)));
        assert_eq!(template().page_count(), 2);
    }

    #[test]
    fn test_offset_media_box_shifts_drawing() {
        let mut doc = template_document();
        let page_id = *doc.get_pages().values().next().unwrap();
        doc.get_dictionary_mut(page_id)
            .unwrap()
            .set(
                "MediaBox",
                vec![
                    Object::Integer(100),
                    Object::Integer(200),
                    Object::Integer(712),
                    Object::Integer(992),
                ],
            );
        let template = Template {
            path: PathBuf::from("shifted.pdf"),
            doc,
            page_id,
        };

        let out = create_output_pdf(
            &sheets_for(1),
            &SheetGeometry::sl655(),
            StandardFont::Helvetica,
            Background::Template(template),
        )
        .unwrap();
        let first = *out.get_pages().values().next().unwrap();
        let content = page_content(&out, first);
        // QR of the first cell at (67.05, 662.4) moved by the box origin
        assert!(content.contains("q 86.4 0 0 86.4 167.05 862.4 cm"));
    }

    #[test]
    fn test_load_template_missing_file() {
        let result = load_template(Path::new("/nonexistent/SL655.pdf"));
        assert!(matches!(result, Err(LabelError::TemplateNotFound(_))));
    }

    #[test]
    fn test_load_template_garbage_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        std::io::Write::write_all(&mut file, b"not a pdf").unwrap();
        let result = load_template(file.path());
        assert!(matches!(result, Err(LabelError::TemplateUnreadable { .. })));
    }

    #[test]
    fn test_qr_failure_aborts_rendering() {
        let entries = LabelRequest::new("x".repeat(8000), 1).entries().unwrap();
        let sheets = SheetLayout::new(SheetGeometry::sl655()).paginate(entries);
        let err = create_output_pdf(
            &sheets,
            &SheetGeometry::sl655(),
            StandardFont::Helvetica,
            Background::Blank,
        )
        .unwrap_err();
        assert_eq!(crate::error::stage_of(&err), Some(crate::error::Stage::Rendering));
    }
}
