#![forbid(unsafe_code)]

//! Console walkthrough of a recycling host driving a mixed feed.
//!
//! A toy host stands in for a real list widget: views are plain text lines,
//! the recycled-view cache is a set of shelves keyed by [`TypeIndex`], and
//! the environment carries a theme generation so a theme switch exercises
//! the non-recyclable branch. A connected listener logs every change.
//!
//! Run with: cargo run -p medley-demo

use medley::{AdapterContext, Converter, Medley, MedleyError, TypeIndex, ViewDispatch};
use tracing::info;

// ---------------------------------------------------------------------------
// Host side
// ---------------------------------------------------------------------------

/// The host's view handle: one rendered line and the theme it was built for.
#[derive(Debug, Clone)]
struct Line {
    text: String,
    theme: u64,
}

/// Render environment: the active theme generation plus build counters.
#[derive(Debug, Default)]
struct Theme {
    generation: u64,
    created: usize,
    rebound: usize,
}

impl Theme {
    fn blank_line(&mut self) -> Line {
        self.created += 1;
        Line {
            text: String::new(),
            theme: self.generation,
        }
    }
}

/// Recycled-view cache keyed by type index, the shape a real host keeps.
struct RowCache {
    shelves: Vec<Vec<Line>>,
}

impl RowCache {
    fn new(view_types: usize) -> Self {
        Self {
            shelves: vec![Vec::new(); view_types],
        }
    }

    fn take(&mut self, type_index: TypeIndex) -> Option<Line> {
        self.shelves[type_index.get()].pop()
    }

    fn put(&mut self, type_index: TypeIndex, view: Line) {
        self.shelves[type_index.get()].push(view);
    }
}

/// Render every row, pulling recycled views from the cache where the
/// position's converter accepts them.
fn render(
    feed: &Medley<Line, Theme>,
    cache: &mut RowCache,
    theme: &mut Theme,
) -> Result<Vec<(TypeIndex, Line)>, MedleyError> {
    let mut screen = Vec::new();
    for position in 0..feed.count() {
        let type_index = feed.view_type_of(position)?;
        let recycled = cache.take(type_index);
        let line = feed.create_or_rebind(position, recycled, theme)?;
        screen.push((type_index, line));
    }
    for (_, line) in &screen {
        println!("  {}", line.text);
    }
    Ok(screen)
}

/// Rows scrolled off screen go back on the shelves for the next pass.
fn scroll_away(cache: &mut RowCache, screen: Vec<(TypeIndex, Line)>) {
    for (type_index, line) in screen {
        cache.put(type_index, line);
    }
}

// ---------------------------------------------------------------------------
// Converters
// ---------------------------------------------------------------------------

#[derive(Debug, PartialEq)]
struct Article {
    title: String,
    comments: u32,
}

#[derive(Default)]
struct HeadingConverter;

impl Converter<Line, Theme> for HeadingConverter {
    type Data = String;

    fn create(&self, theme: &mut Theme) -> Line {
        theme.blank_line()
    }

    fn bind(
        &self,
        view: &mut Line,
        data: &String,
        _position: usize,
        theme: &mut Theme,
        _ctx: &AdapterContext<'_>,
    ) {
        theme.rebound += 1;
        view.text = format!("== {data} ==");
    }

    // Headings bake theme colors into the view, so a stale-theme view
    // cannot be patched up by bind alone.
    fn recyclable(&self, view: &Line, theme: &Theme) -> bool {
        view.theme == theme.generation
    }
}

#[derive(Default)]
struct ArticleConverter;

impl Converter<Line, Theme> for ArticleConverter {
    type Data = Article;

    fn create(&self, theme: &mut Theme) -> Line {
        theme.blank_line()
    }

    fn bind(
        &self,
        view: &mut Line,
        data: &Article,
        position: usize,
        theme: &mut Theme,
        ctx: &AdapterContext<'_>,
    ) {
        theme.rebound += 1;
        view.text = format!(
            "{} ({} comments)  [{}/{}]",
            data.title,
            data.comments,
            position + 1,
            ctx.len()
        );
    }
}

#[derive(Default)]
struct RuleConverter;

impl Converter<Line, Theme> for RuleConverter {
    type Data = ();

    fn create(&self, theme: &mut Theme) -> Line {
        theme.blank_line()
    }

    fn bind(
        &self,
        view: &mut Line,
        _data: &(),
        _position: usize,
        theme: &mut Theme,
        _ctx: &AdapterContext<'_>,
    ) {
        theme.rebound += 1;
        view.text = String::from("----------------------------------------");
    }

    fn enabled(&self, _data: &(), _position: usize, _ctx: &AdapterContext<'_>) -> bool {
        false
    }
}

#[derive(Default)]
struct FooterConverter;

impl Converter<Line, Theme> for FooterConverter {
    type Data = String;

    fn create(&self, theme: &mut Theme) -> Line {
        theme.blank_line()
    }

    fn bind(
        &self,
        view: &mut Line,
        data: &String,
        _position: usize,
        theme: &mut Theme,
        _ctx: &AdapterContext<'_>,
    ) {
        theme.rebound += 1;
        view.text = format!("~ {data} ~");
    }
}

// ---------------------------------------------------------------------------
// Walkthrough
// ---------------------------------------------------------------------------

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let subscriber = tracing_subscriber::fmt()
        .with_max_level(tracing::Level::TRACE)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    // Build the feed before any listener attaches; the type set is still
    // open here, so first use registers each converter type.
    let mut feed: Medley<Line, Theme> = Medley::new();
    feed.append(HeadingConverter, String::from("Morning edition"))?;
    feed.append_all_of::<ArticleConverter>(vec![
        Article {
            title: String::from("Adapter ships"),
            comments: 12,
        },
        Article {
            title: String::from("Recycling works"),
            comments: 3,
        },
    ])?;
    feed.append(RuleConverter, ())?;
    feed.append_of::<HeadingConverter>(String::from("Archive"))?;

    // Wire the feed to the "widget": every change is logged from here on,
    // and the type set is frozen.
    let _conn = feed.connect(|change| info!(?change, "feed changed"));

    let mut theme = Theme::default();
    let mut cache = RowCache::new(feed.view_type_count());

    println!("first pass (everything is created):");
    let screen = render(&feed, &mut cache, &mut theme)?;
    println!("  -> created {}, rebound {}", theme.created, theme.rebound);
    scroll_away(&mut cache, screen);

    // Mutations while connected: one logged event per call.
    feed.insert_of::<ArticleConverter>(
        1,
        Article {
            title: String::from("Inserts land mid-list"),
            comments: 0,
        },
    )?;
    feed.remove_first_value(&Article {
        title: String::from("Recycling works"),
        comments: 3,
    })?;

    println!("second pass (same theme, shelved views are rebound):");
    let screen = render(&feed, &mut cache, &mut theme)?;
    println!("  -> created {}, rebound {}", theme.created, theme.rebound);
    scroll_away(&mut cache, screen);

    // The cache above was sized from view_type_count(), so the connected
    // feed refuses a type it has never seen.
    if let Err(err) = feed.append(FooterConverter, String::from("fin")) {
        info!(%err, "rejected while connected");
    }

    // A theme switch: headings refuse their stale views, everything else
    // keeps recycling.
    theme.generation += 1;
    println!("third pass (new theme, headings are rebuilt):");
    render(&feed, &mut cache, &mut theme)?;
    println!("  -> created {}, rebound {}", theme.created, theme.rebound);

    Ok(())
}
