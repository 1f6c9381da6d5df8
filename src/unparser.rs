use bytes::{BufMut, BytesMut};

use crate::errors::*;
use crate::protocol::{Frame, FrameOrKeepAlive};

// Nothing is escaped on the way out, so anything that would change where a
// line or the frame ends is refused before the buffer is touched.
fn check_frame(frame: &Frame) -> Result<()> {
    for (k, v) in frame.headers().iter() {
        if k.contains(|c: char| c == '\n' || c == '\r' || c == ':') {
            return Err(StompError::InvalidFrame(format!("header key {:?}", k)));
        }
        if v.contains(|c: char| c == '\n' || c == '\r') {
            return Err(StompError::InvalidFrame(format!(
                "header {:?} value {:?}",
                k, v
            )));
        }
    }
    if let Some(pos) = frame.body().and_then(|b| b.iter().position(|&c| c == 0)) {
        return Err(StompError::InvalidFrame(format!(
            "NUL in body at offset {}",
            pos
        )));
    }
    Ok(())
}

pub(crate) fn encode_frame(buf: &mut BytesMut, frame: &Frame) -> Result<()> {
    check_frame(frame)?;

    buf.put_slice(frame.command().as_str().as_bytes());
    buf.put_u8(b'\n');

    for (k, v) in frame.headers().iter() {
        buf.put_slice(k.as_bytes());
        buf.put_u8(b':');
        buf.put_slice(v.as_bytes());
        buf.put_u8(b'\n');
    }

    buf.put_u8(b'\n');

    if let Some(body) = frame.body() {
        buf.put_slice(body);
    }

    buf.put_u8(b'\0');

    Ok(())
}

pub(crate) fn encode_item(buf: &mut BytesMut, item: &FrameOrKeepAlive) -> Result<()> {
    match item {
        FrameOrKeepAlive::Frame(frame) => encode_frame(buf, frame),
        FrameOrKeepAlive::KeepAlive => {
            buf.put_u8(b'\n');
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::Command;

    fn encoded(frame: &Frame) -> BytesMut {
        let mut buf = BytesMut::new();
        encode_frame(&mut buf, frame).expect("encode frame");
        buf
    }

    #[test]
    fn should_encode_trivial_example() {
        let frame = Frame::new(Command::Send);

        assert_eq!(&*b"SEND\n\n\0", &*encoded(&frame));
    }

    #[test]
    fn should_encode_connect_frame() {
        let frame = Frame::connect("example", "u", "p");

        assert_eq!(
            &*b"CONNECT\naccept-version:1.2\nhost:example\nlogin:u\npasscode:p\n\n\0",
            &*encoded(&frame)
        );
    }

    #[test]
    fn should_encode_send_with_body() {
        let frame = Frame::send("/topic/a", "Hello World");

        assert_eq!(
            &*b"SEND\ndestination:/topic/a\n\nHello World\0",
            &*encoded(&frame)
        );
    }

    #[test]
    fn bodyless_frames_end_with_blank_line_and_nul() {
        let frame = Frame::subscribe("/topic/a", "17", Some("77"));
        let buf = encoded(&frame);

        assert!(buf.ends_with(b"receipt:77\n\n\0"));
        assert_eq!(buf.iter().filter(|&&b| b == 0).count(), 1);
    }

    #[test]
    fn empty_body_is_still_terminated_once() {
        let frame = Frame::new(Command::Send).with_body(Vec::new());

        assert_eq!(&*b"SEND\n\n\0", &*encoded(&frame));
    }

    #[test]
    fn headers_are_written_in_insertion_order() {
        let frame = Frame::new(Command::Send)
            .with_header("z", "1")
            .with_header("a", "2")
            .with_header("z", "3")
            .with_header("m", "value:with:colons");

        assert_eq!(
            &*b"SEND\nz:1\na:2\nz:3\nm:value:with:colons\n\n\0",
            &*encoded(&frame)
        );
    }

    #[test]
    fn refuses_nul_in_body() {
        let frame = Frame::send("/topic/a", &b"a\0b"[..]);
        let mut buf = BytesMut::new();

        let err = encode_frame(&mut buf, &frame).expect_err("should refuse");
        assert!(matches!(err, StompError::InvalidFrame(_)), "{:?}", err);
        assert!(buf.is_empty());
    }

    #[test]
    fn refuses_line_breaks_in_headers() {
        for frame in [
            Frame::new(Command::Send).with_header("a\nb", "c"),
            Frame::new(Command::Send).with_header("a:b", "c"),
            Frame::new(Command::Send).with_header("a", "b\r\nc"),
        ] {
            let mut buf = BytesMut::new();
            assert!(encode_frame(&mut buf, &frame).is_err(), "{:?}", frame);
            assert!(buf.is_empty());
        }
    }

    #[test]
    fn keepalive_is_a_bare_newline() {
        let mut buf = BytesMut::new();
        encode_item(&mut buf, &FrameOrKeepAlive::KeepAlive).expect("encode");
        assert_eq!(&*b"\n", &*buf);
    }
}
