//! Read-only view over a PDML document (`tshark -T pdml`).
//!
//! Kerberos messages live at `pdml > packet > proto[name="kerberos"]`; the
//! proto's `showname` declares the message kind and its descendant `field`
//! elements carry the decoded values as attributes.
use roxmltree::{Document, Node};

pub const ROOT_TAG: &str = "pdml";
pub const PACKET_TAG: &str = "packet";
pub const PROTO_TAG: &str = "proto";
pub const FIELD_TAG: &str = "field";
pub const KERBEROS_PROTO: &str = "kerberos";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessageKind {
    AsReq,
    KrbError,
    AsRep,
    Other,
}

impl MessageKind {
    pub fn from_showname(showname: Option<&str>) -> Self {
        match showname {
            Some("Kerberos AS-REQ") => MessageKind::AsReq,
            Some("Kerberos KRB-ERROR") => MessageKind::KrbError,
            Some("Kerberos AS-REP") => MessageKind::AsRep,
            _ => MessageKind::Other,
        }
    }
}

/// One decoded field. PDML does not set every attribute on every field.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct Field<'a> {
    pub name: Option<&'a str>,
    pub value: Option<&'a str>,
    pub show: Option<&'a str>,
    pub showname: Option<&'a str>,
}

impl<'a> Field<'a> {
    fn from_node(node: Node<'a, '_>) -> Self {
        Self {
            name: node.attribute("name"),
            value: node.attribute("value"),
            show: node.attribute("show"),
            showname: node.attribute("showname"),
        }
    }
}

/// A `proto name="kerberos"` element.
#[derive(Debug, Clone, Copy)]
pub struct Message<'a, 'input> {
    node: Node<'a, 'input>,
}

impl<'a, 'input> Message<'a, 'input> {
    pub fn showname(&self) -> Option<&'a str> {
        self.node.attribute("showname")
    }

    pub fn kind(&self) -> MessageKind {
        MessageKind::from_showname(self.showname())
    }

    /// Descendant fields at any depth, in document order.
    pub fn fields(self) -> impl Iterator<Item = Field<'a>> {
        self.node
            .descendants()
            .filter(|n| n.has_tag_name(FIELD_TAG))
            .map(Field::from_node)
    }
}

pub fn is_pdml(doc: &Document<'_>) -> bool {
    doc.root_element().has_tag_name(ROOT_TAG)
}

/// Kerberos messages in document order. Yields nothing when the root is not
/// `pdml`.
pub fn kerberos_messages<'a, 'input>(
    doc: &'a Document<'input>,
) -> impl Iterator<Item = Message<'a, 'input>> {
    Some(doc.root_element())
        .filter(|root| root.has_tag_name(ROOT_TAG))
        .into_iter()
        .flat_map(|root| root.children())
        .filter(|n| n.has_tag_name(PACKET_TAG))
        .flat_map(|packet| packet.children())
        .filter(|n| n.has_tag_name(PROTO_TAG) && n.attribute("name") == Some(KERBEROS_PROTO))
        .map(|node| Message { node })
}

#[cfg(test)]
pub(crate) mod testdoc {
    //! Small PDML builder shared by unit tests.

    pub const SALT_HEX: &str = "4558414d504c452e434f4d616c696365";
    pub const USER: &str = "alice";
    pub const REALM: &str = "EXAMPLE.COM";

    pub fn timestamp() -> String {
        format!("{}{}", "A".repeat(88), "B".repeat(88))
    }

    pub fn packet(showname: &str, fields: &str) -> String {
        format!(
            "<packet>\n<proto name=\"geninfo\" pos=\"0\" showname=\"General information\"/>\n\
             <proto name=\"kerberos\" showname=\"{}\" size=\"200\" pos=\"42\">\n\
             <field name=\"kerberos.pvno\" showname=\"pvno: 5\" show=\"5\" value=\"05\"/>\n\
             {}\n</proto>\n</packet>\n",
            showname, fields
        )
    }

    pub fn as_req() -> String {
        packet("Kerberos AS-REQ", "")
    }

    pub fn as_req_with_timestamp(ts: &str) -> String {
        packet(
            "Kerberos AS-REQ",
            &format!(
                "<field name=\"kerberos.padata\" showname=\"padata: 1 item\">\n\
                 <field name=\"kerberos.PA_ENC_TIMESTAMP.encrypted\" \
                 showname=\"enc PA_ENC_TIMESTAMP: {ts}\" show=\"{ts}\" value=\"{ts}\"/>\n\
                 </field>"
            ),
        )
    }

    pub fn krb_error_ad(salt_hex: &str) -> String {
        packet(
            "Kerberos KRB-ERROR",
            &format!(
                "<field name=\"kerberos.realm\" showname=\"Realm: {REALM}\" show=\"{REALM}\" value=\"4558414d504c452e434f4d\"/>\n\
                 <field name=\"kerberos.e_data\" showname=\"e-data\">\n\
                 <field name=\"kerberos.etype_info2.salt\" showname=\"Salt: {salt_hex}\" show=\"{salt_hex}\" value=\"{salt_hex}\"/>\n\
                 </field>"
            ),
        )
    }

    pub fn krb_error_plain(user: &str) -> String {
        packet(
            "Kerberos KRB-ERROR",
            &format!(
                "<field name=\"kerberos.cname\" showname=\"Client Name (Principal): {user}\" show=\"\"/>\n\
                 <field name=\"kerberos.realm\" showname=\"Realm: {REALM}\" show=\"{REALM}\" value=\"4558414d504c452e434f4d\"/>"
            ),
        )
    }

    pub fn as_rep() -> String {
        packet("Kerberos AS-REP", "")
    }

    pub fn dump(packets: &[String]) -> String {
        format!(
            "<?xml version=\"1.0\"?>\n<pdml version=\"0\" creator=\"wireshark/1.10.0\">\n{}</pdml>\n",
            packets.concat()
        )
    }

    pub fn ad_exchange() -> String {
        dump(&[
            as_req(),
            krb_error_ad(SALT_HEX),
            as_req_with_timestamp(&timestamp()),
            as_rep(),
        ])
    }

    pub fn plain_exchange() -> String {
        dump(&[
            as_req(),
            krb_error_plain(USER),
            as_req_with_timestamp(&timestamp()),
            as_rep(),
        ])
    }
}
