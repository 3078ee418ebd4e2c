/// Generate the browser script behind the "Carregar mais posts" button.
///
/// Mirrors [`crate::pagination::PostList`]: one request in flight at a time,
/// the cursor only advances on success, a failure leaves the button in place
/// and shows a message, and the button is removed once the last page is in.
pub fn generate_load_more_js() -> &'static str {
    r#"// Load more posts from the CMS cursor
(() => {
    const MONTHS = ['Jan', 'Fev', 'Mar', 'Abr', 'Mai', 'Jun', 'Jul', 'Ago', 'Set', 'Out', 'Nov', 'Dez'];

    const button = document.getElementById('load-more');
    const list = document.getElementById('post-list');
    const status = document.getElementById('load-more-status');
    if (!button || !list) return;

    let inFlight = false;

    function text(value) {
        if (typeof value === 'string') return value;
        if (Array.isArray(value)) {
            return value.map(block => (block && block.text) || '').filter(Boolean).join(' ');
        }
        return '';
    }

    function formatDate(iso) {
        if (!iso) return '';
        // "+0000" offsets are not parsed consistently across browsers
        const date = new Date(iso.replace(/([+-]\d{2})(\d{2})$/, '$1:$2'));
        if (Number.isNaN(date.getTime())) return iso;
        const day = String(date.getUTCDate()).padStart(2, '0');
        return `${day} ${MONTHS[date.getUTCMonth()]} ${date.getUTCFullYear()}`;
    }

    // Same encoding as the server-rendered links: only A-Z a-z 0-9 - _ . ~ stay literal
    function encodeUid(uid) {
        return encodeURIComponent(uid).replace(/[!'()*]/g, c => '%' + c.charCodeAt(0).toString(16).toUpperCase());
    }

    function renderPost(post) {
        const data = post.data || {};

        const link = document.createElement('a');
        link.className = 'post';
        link.href = post.uid ? `/post/${encodeUid(post.uid)}` : '/';

        const title = document.createElement('strong');
        title.textContent = text(data.title);

        const subtitle = document.createElement('p');
        subtitle.textContent = text(data.subtitle);

        const info = document.createElement('div');
        info.className = 'info';
        const time = document.createElement('time');
        time.textContent = formatDate(post.first_publication_date);
        const author = document.createElement('span');
        author.textContent = text(data.author);
        info.append(time, author);

        link.append(title, subtitle, info);
        return link;
    }

    async function loadMore() {
        const cursor = button.dataset.nextPage;
        if (inFlight || !cursor) return;

        inFlight = true;
        button.disabled = true;
        if (status) status.textContent = '';

        try {
            const response = await fetch(cursor);
            if (!response.ok) throw new Error(`HTTP ${response.status}`);
            const page = await response.json();

            (page.results || []).forEach(post => list.appendChild(renderPost(post)));

            if (page.next_page) {
                button.dataset.nextPage = page.next_page;
            } else {
                button.remove();
                if (status) status.remove();
            }
        } catch (err) {
            console.error('Failed to load more posts:', err);
            if (status) status.textContent = 'Não foi possível carregar mais posts. Tente novamente.';
        } finally {
            inFlight = false;
            button.disabled = false;
        }
    }

    button.addEventListener('click', loadMore);
})();
"#
}
