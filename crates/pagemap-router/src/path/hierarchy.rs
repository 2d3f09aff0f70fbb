/// Lazy iterator over the ancestor directories of a page stem
///
/// For stem `about/[id]/more`, yields: `about/[id]` → `about`
///
/// Used to find layout files: a page `X.vue` is the layout of everything
/// under the directory `X/`, so the layouts of a route are the pages whose
/// stems are ancestors of its stem. The stem itself is not yielded.
///
/// # Examples
///
/// ```
/// use pagemap_router::path::StemHierarchy;
///
/// let parents: Vec<&str> = StemHierarchy::new("about/[id]/more").collect();
/// assert_eq!(parents, vec!["about/[id]", "about"]);
///
/// assert_eq!(StemHierarchy::new("about").next(), None);
/// ```
#[derive(Debug, Clone)]
pub struct StemHierarchy<'a> {
    current: &'a str,
}

impl<'a> StemHierarchy<'a> {
    pub fn new(stem: &'a str) -> Self {
        Self {
            current: stem.trim_matches('/'),
        }
    }
}

impl<'a> Iterator for StemHierarchy<'a> {
    type Item = &'a str;

    fn next(&mut self) -> Option<Self::Item> {
        let (parent, _) = self.current.rsplit_once('/')?;
        self.current = parent;
        Some(parent)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stem_hierarchy() {
        let parents: Vec<&str> = StemHierarchy::new("a/b/c/d").collect();
        assert_eq!(parents, vec!["a/b/c", "a/b", "a"]);

        let parents: Vec<&str> = StemHierarchy::new("blog/today/index").collect();
        assert_eq!(parents, vec!["blog/today", "blog"]);
    }

    #[test]
    fn test_stem_hierarchy_top_level() {
        assert_eq!(StemHierarchy::new("index").count(), 0);
        assert_eq!(StemHierarchy::new("").count(), 0);
    }

    #[test]
    fn test_stem_hierarchy_short_circuit() {
        let mut iter = StemHierarchy::new("a/b/c/d");
        assert_eq!(iter.find(|&p| p == "a/b"), Some("a/b"));
        assert_eq!(iter.next(), Some("a"));
    }
}
