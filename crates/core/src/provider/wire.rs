//! Decoding of the provider's REST XML envelopes.

use chrono::DateTime;
use quick_xml::events::Event;
use quick_xml::Reader;
use serde::Deserialize;

use super::types::{PageResult, PhotoDetail, PhotoOwner, PhotoStub};
use super::ProviderError;

// ============================================================================
// Wire Types (private)
// ============================================================================

#[derive(Debug, Deserialize)]
struct Rsp {
    #[serde(rename = "@stat", default)]
    stat: String,
    #[serde(default)]
    err: Option<WireErr>,
    #[serde(default)]
    photos: Option<WirePhotos>,
    #[serde(default)]
    photo: Option<WirePhotoInfo>,
}

#[derive(Debug, Deserialize)]
struct WireErr {
    #[serde(rename = "@code", default)]
    code: u32,
    #[serde(rename = "@msg", default)]
    msg: String,
}

#[derive(Debug, Deserialize)]
struct WirePhotos {
    #[serde(rename = "@page", default)]
    page: u32,
    #[serde(rename = "@pages", default)]
    pages: u32,
    #[serde(rename = "@total", default)]
    total: u64,
    #[serde(default)]
    photo: Vec<WireStub>,
}

#[derive(Debug, Deserialize)]
struct WireStub {
    #[serde(rename = "@id")]
    id: String,
    #[serde(rename = "@owner")]
    owner: String,
    #[serde(rename = "@ownername", default)]
    owner_name: String,
    #[serde(rename = "@title", default)]
    title: String,
    #[serde(rename = "@secret")]
    secret: String,
    #[serde(rename = "@server")]
    server: String,
}

#[derive(Debug, Deserialize)]
struct WirePhotoInfo {
    #[serde(rename = "@dateuploaded")]
    date_uploaded: i64,
    #[serde(rename = "@license")]
    license: i32,
    owner: WireOwner,
    #[serde(default)]
    title: WireText,
    #[serde(default)]
    description: WireText,
    #[serde(default)]
    urls: WireUrls,
}

#[derive(Debug, Deserialize)]
struct WireOwner {
    #[serde(rename = "@nsid")]
    nsid: String,
    #[serde(rename = "@username", default)]
    username: String,
    #[serde(rename = "@realname", default)]
    realname: String,
}

#[derive(Debug, Default, Deserialize)]
struct WireText {
    #[serde(rename = "$text", default)]
    value: String,
}

#[derive(Debug, Default, Deserialize)]
struct WireUrls {
    #[serde(default)]
    url: Vec<WireUrl>,
}

#[derive(Debug, Deserialize)]
struct WireUrl {
    #[serde(rename = "@type", default)]
    kind: String,
    #[serde(rename = "$text", default)]
    value: String,
}

impl From<WireStub> for PhotoStub {
    fn from(s: WireStub) -> Self {
        PhotoStub {
            id: s.id,
            owner: s.owner,
            owner_name: s.owner_name,
            title: s.title,
            secret: s.secret,
            server: s.server,
        }
    }
}

fn parse_envelope(body: &str) -> Result<Rsp, ProviderError> {
    let rsp: Rsp =
        quick_xml::de::from_str(body).map_err(|e| ProviderError::Decode(e.to_string()))?;

    if rsp.stat == "fail" {
        let (code, message) = rsp
            .err
            .map(|e| (e.code, e.msg))
            .unwrap_or((0, "unspecified failure".to_string()));
        return Err(ProviderError::Api { code, message });
    }

    Ok(rsp)
}

/// Text of `<rsp><photo><{child}>` exactly as sent.
///
/// The serde deserializer trims surrounding whitespace from text nodes; titles
/// and descriptions are embedded verbatim, so they are read from the raw
/// event stream instead. Returns `None` when the element is absent or empty.
fn untrimmed_photo_text(body: &str, child: &str) -> Result<Option<String>, ProviderError> {
    let mut reader = Reader::from_str(body);
    let mut path: Vec<String> = Vec::new();
    let mut text: Option<String> = None;

    loop {
        let event = reader
            .read_event()
            .map_err(|e| ProviderError::Decode(e.to_string()))?;
        let inside = matches!(
            path.as_slice(),
            [rsp, photo, name] if rsp == "rsp" && photo == "photo" && name == child
        );

        match event {
            Event::Start(e) => {
                path.push(String::from_utf8_lossy(e.local_name().as_ref()).into_owned());
            }
            Event::End(_) => {
                if inside {
                    return Ok(text);
                }
                path.pop();
            }
            Event::Text(t) if inside => {
                let unescaped = t
                    .unescape()
                    .map_err(|e| ProviderError::Decode(e.to_string()))?;
                text.get_or_insert_with(String::new).push_str(&unescaped);
            }
            Event::CData(c) if inside => {
                text.get_or_insert_with(String::new)
                    .push_str(&String::from_utf8_lossy(&c));
            }
            Event::Eof => return Ok(text),
            _ => {}
        }
    }
}

/// Decode a photo-search response body.
pub fn decode_search(body: &str) -> Result<PageResult, ProviderError> {
    let photos = parse_envelope(body)?
        .photos
        .ok_or_else(|| ProviderError::Decode("response has no <photos> element".to_string()))?;

    Ok(PageResult {
        page: photos.page,
        pages: photos.pages,
        total: photos.total,
        photos: photos.photo.into_iter().map(PhotoStub::from).collect(),
    })
}

/// Decode a photo-info response body.
pub fn decode_detail(body: &str) -> Result<PhotoDetail, ProviderError> {
    let info = parse_envelope(body)?
        .photo
        .ok_or_else(|| ProviderError::Decode("response has no <photo> element".to_string()))?;

    let uploaded_at = DateTime::from_timestamp(info.date_uploaded, 0).ok_or_else(|| {
        ProviderError::Decode(format!(
            "dateuploaded out of range: {}",
            info.date_uploaded
        ))
    })?;

    // Prefer the photo page; fall back to whatever URL is listed first.
    let page_url = info
        .urls
        .url
        .iter()
        .find(|u| u.kind == "photopage")
        .or_else(|| info.urls.url.first())
        .map(|u| u.value.trim().to_string())
        .unwrap_or_default();

    let title = untrimmed_photo_text(body, "title")?.unwrap_or(info.title.value);
    let description =
        untrimmed_photo_text(body, "description")?.unwrap_or(info.description.value);

    Ok(PhotoDetail {
        uploaded_at,
        license: info.license,
        owner: PhotoOwner {
            id: info.owner.nsid,
            username: info.owner.username,
            real_name: info.owner.realname,
        },
        title,
        description,
        page_url,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const SEARCH_OK: &str = r#"<?xml version="1.0" encoding="utf-8" ?>
<rsp stat="ok">
<photos page="1" pages="42" perpage="3" total="125">
	<photo id="5001" owner="11@N01" secret="aa11" server="65535" farm="66" title="Red panda napping" ispublic="1" isfriend="0" isfamily="0" ownername="Ann" />
	<photo id="5002" owner="22@N02" secret="bb22" server="65535" farm="66" title="" ispublic="1" isfriend="0" isfamily="0" ownername="Bo" />
</photos>
</rsp>"#;

    const INFO_OK: &str = r#"<?xml version="1.0" encoding="utf-8" ?>
<rsp stat="ok">
<photo id="5001" secret="aa11" server="65535" farm="66" dateuploaded="1600000000" isfavorite="0" license="4" safety_level="0" rotation="0" views="10" media="photo">
	<owner nsid="11@N01" username="annphoto" realname="Ann Example" location="" iconserver="1" iconfarm="1" path_alias="" />
	<title>Red panda napping</title>
	<description>Seen at the zoo &amp; fed bamboo.</description>
	<dates posted="1600000000" taken="2020-09-01 10:00:00" takengranularity="0" takenunknown="0" lastupdate="1600000100" />
	<urls>
		<url type="photopage">https://www.flickr.com/photos/annphoto/5001/</url>
	</urls>
</photo>
</rsp>"#;

    #[test]
    fn test_decode_search() {
        let page = decode_search(SEARCH_OK).unwrap();
        assert_eq!(page.page, 1);
        assert_eq!(page.pages, 42);
        assert_eq!(page.total, 125);
        assert_eq!(page.total_on_page(), 2);
        assert_eq!(page.photos[0].id, "5001");
        assert_eq!(page.photos[0].owner, "11@N01");
        assert_eq!(page.photos[0].owner_name, "Ann");
        assert_eq!(page.photos[0].secret, "aa11");
        assert_eq!(page.photos[0].server, "65535");
        assert_eq!(page.photos[1].title, "");
    }

    #[test]
    fn test_decode_empty_search_page() {
        let body = r#"<rsp stat="ok"><photos page="3" pages="2" perpage="100" total="150"></photos></rsp>"#;
        let page = decode_search(body).unwrap();
        assert!(page.photos.is_empty());
        assert_eq!(page.page, 3);
    }

    #[test]
    fn test_decode_detail() {
        let detail = decode_detail(INFO_OK).unwrap();
        assert_eq!(detail.uploaded_at.timestamp(), 1_600_000_000);
        assert_eq!(detail.license, 4);
        assert_eq!(detail.owner.id, "11@N01");
        assert_eq!(detail.owner.username, "annphoto");
        assert_eq!(detail.owner.real_name, "Ann Example");
        assert_eq!(detail.title, "Red panda napping");
        assert_eq!(detail.description, "Seen at the zoo & fed bamboo.");
        assert_eq!(detail.page_url, "https://www.flickr.com/photos/annphoto/5001/");
    }

    #[test]
    fn test_decode_detail_keeps_surrounding_whitespace() {
        let body = "<rsp stat=\"ok\"><photo id=\"9\" dateuploaded=\"1\" license=\"4\">\
            <owner nsid=\"n\" username=\"u\" realname=\"\" />\
            <title> padded title </title>\
            <description>\nline one &amp;\n\nline two\n</description>\
            <comments>0</comments></photo></rsp>";
        let detail = decode_detail(body).unwrap();
        assert_eq!(detail.title, " padded title ");
        assert_eq!(detail.description, "\nline one &\n\nline two\n");
    }

    #[test]
    fn test_decode_detail_with_empty_description_and_no_urls() {
        let body = r#"<rsp stat="ok"><photo id="9" dateuploaded="1" license="0"><owner nsid="n" username="u" realname="" /><title>t</title><description /></photo></rsp>"#;
        let detail = decode_detail(body).unwrap();
        assert_eq!(detail.description, "");
        assert_eq!(detail.page_url, "");
        assert_eq!(detail.license, 0);
    }

    #[test]
    fn test_decode_detail_prefers_photopage_url() {
        let body = r#"<rsp stat="ok"><photo id="9" dateuploaded="1" license="5"><owner nsid="n" username="u" realname="r" /><urls><url type="other">https://a.example/</url><url type="photopage">https://b.example/</url></urls></photo></rsp>"#;
        let detail = decode_detail(body).unwrap();
        assert_eq!(detail.page_url, "https://b.example/");
    }

    #[test]
    fn test_decode_fail_envelope() {
        let body = r#"<?xml version="1.0" encoding="utf-8" ?>
<rsp stat="fail">
	<err code="100" msg="Invalid API Key (Key has invalid format)" />
</rsp>"#;
        let err = decode_search(body).unwrap_err();
        match err {
            ProviderError::Api { code, message } => {
                assert_eq!(code, 100);
                assert!(message.starts_with("Invalid API Key"));
            }
            other => panic!("expected Api error, got {:?}", other),
        }
    }

    #[test]
    fn test_decode_malformed_body() {
        let err = decode_search("<html><body>Bad Gateway").unwrap_err();
        assert!(matches!(err, ProviderError::Decode(_)));
    }

    #[test]
    fn test_decode_search_missing_photos() {
        let err = decode_search(r#"<rsp stat="ok"></rsp>"#).unwrap_err();
        assert!(matches!(err, ProviderError::Decode(_)));
    }

    #[test]
    fn test_decode_detail_bad_license_attribute() {
        let body = r#"<rsp stat="ok"><photo dateuploaded="1" license="cc-by"><owner nsid="n" /></photo></rsp>"#;
        let err = decode_detail(body).unwrap_err();
        assert!(matches!(err, ProviderError::Decode(_)));
    }
}
