use lopdf::{Dictionary, Document, Object, ObjectId};

/// Resolve an object that may be an indirect reference into a dictionary.
pub fn resolve_dict(doc: &Document, object: &Object) -> Option<Dictionary> {
    match object {
        Object::Dictionary(d) => Some(d.clone()),
        Object::Reference(id) => doc.get_dictionary(*id).ok().cloned(),
        _ => None,
    }
}

/// Build the resources dictionary for one output page.
///
/// Starts from the background page's resources (if any), then:
/// 1. Adds our font under `font_name`, keeping the existing fonts
/// 2. Merges the page's image XObjects into any existing XObject dictionary
///
/// The result is inline, so pages that share a template's resources never
/// see each other's images.
pub fn build_page_resources(
    doc: &Document,
    base_resources: Option<&Dictionary>,
    font_name: &str,
    font_id: ObjectId,
    xobject_dict: &Dictionary,
) -> Dictionary {
    let mut resources = base_resources.cloned().unwrap_or_else(Dictionary::new);

    let mut font_resources = resources
        .get(b"Font")
        .ok()
        .and_then(|f| resolve_dict(doc, f))
        .unwrap_or_else(Dictionary::new);
    font_resources.set(font_name, Object::Reference(font_id));
    resources.set("Font", Object::Dictionary(font_resources));

    if !xobject_dict.is_empty() {
        let mut xobject_resources = resources
            .get(b"XObject")
            .ok()
            .and_then(|x| resolve_dict(doc, x))
            .unwrap_or_else(Dictionary::new);
        for (key, value) in xobject_dict.iter() {
            xobject_resources.set(key.to_vec(), value.clone());
        }
        resources.set("XObject", Object::Dictionary(xobject_resources));
    }

    resources
}
