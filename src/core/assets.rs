use serde::Serialize;

use crate::cmd;
use crate::error::Result;
use crate::session::Session;

/// A favicon rendered from `assets/favicons/favicon.svg`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Favicon {
    pub id: &'static str,
    pub size: u32,
    pub name: &'static str,
}

pub const FAVICON_DIR: &str = "assets/favicons/";
pub const FAVICON_SOURCE: &str = "favicon.svg";

pub const FAVICONS: &[Favicon] = &[
    Favicon {
        id: "ico",
        size: 32,
        name: "favicon.ico",
    },
    Favicon {
        id: "apple-57",
        size: 57,
        name: "apple-touch-icon-precomposed.png",
    },
    Favicon {
        id: "apple-72",
        size: 72,
        name: "apple-touch-icon-72x72-precomposed.png",
    },
    Favicon {
        id: "apple-114",
        size: 114,
        name: "apple-touch-icon-114x114-precomposed.png",
    },
    Favicon {
        id: "apple-144",
        size: 144,
        name: "apple-touch-icon-144x144-precomposed.png",
    },
    Favicon {
        id: "fb",
        size: 300,
        name: "opengraph-icon.png",
    },
];

/// Local directory `collectstatic` writes to, and the tree that gets shipped.
pub const STATIC_DIR: &str = "static";

/// Regenerate every favicon from the SVG source.
pub fn make_favicons(session: &mut Session) -> Result<()> {
    session.in_local_dir(FAVICON_DIR, |s| {
        for icon in FAVICONS {
            s.local(cmd!(
                "convert",
                FAVICON_SOURCE,
                "-resize",
                icon.size.to_string(),
                icon.name
            ))?;
        }
        Ok(())
    })
}

/// Collect static files (favicons included) and publish them to the bucket
/// with public-read access.
pub fn collect_and_publish_static_assets(session: &mut Session) -> Result<()> {
    make_favicons(session)?;

    session.local(cmd!("rm", "-rf", STATIC_DIR))?;
    session.in_local_dir("app", |s| s.local(cmd!("./manage.py", "collectstatic")))?;

    let settings = session.settings().clone();
    session.local(
        cmd!("s3put", "-a", settings.aws_access_key, "-s")
            .secret_arg(settings.aws_secret)
            .args([
                "-b".to_string(),
                settings.s3_bucket,
                "-p".to_string(),
                settings.local_dir,
                "-g".to_string(),
                "public-read".to_string(),
                STATIC_DIR.to_string(),
            ]),
    )
}
